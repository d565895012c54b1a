use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, UserCountDto};
use crate::services::PublicUser;

const DEFAULT_USER_LIMIT: u64 = 100;
const MAX_USER_LIMIT: u64 = 500;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub limit: Option<u64>,
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Vec<PublicUser>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_USER_LIMIT);
    if !(1..=MAX_USER_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {limit}. Limit must be between 1 and {MAX_USER_LIMIT}"
        )));
    }

    let users = state.auth_service().list_users(limit).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// GET /users/count
pub async fn count_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<UserCountDto>>, ApiError> {
    let user_count = state.auth_service().count_users().await?;
    Ok(Json(ApiResponse::success(UserCountDto { user_count })))
}
