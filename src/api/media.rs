use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::{parse_media_kind, validate_tmdb_id};
use super::{ApiError, ApiResponse, AppState, MediaDto};
use crate::services::{AuthUser, MediaError};

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Validation(msg) => ApiError::ValidationError(msg),
            MediaError::Unsupported(msg) => ApiError::NotImplemented(msg),
            MediaError::ExternalDependency { service, message } => {
                ApiError::ExternalApiError { service, message }
            }
            MediaError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

/// POST /media/{media_type}/{tmdb_id}/refresh
/// Overwrites the cached row with fresh catalog details.
pub async fn refresh_media(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((media_type, tmdb_id)): Path<(String, i32)>,
) -> Result<Json<ApiResponse<MediaDto>>, ApiError> {
    let kind = parse_media_kind(&media_type)?;
    let tmdb_id = validate_tmdb_id(tmdb_id)?;

    let media = state.media_resolver().refresh(tmdb_id, kind).await?;
    tracing::info!(user_id = %user.id, media_id = %media.id, "Media refresh requested");

    Ok(Json(ApiResponse::success(media.into())))
}
