use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;
use uuid::Uuid;

use super::validation::{parse_media_kind, validate_page, validate_tmdb_id};
use super::{ApiError, ApiResponse, AppState, DeletedDto, PageQuery, RatingBody};
use crate::services::{AuthUser, MediaRatingStats, RatingError, RatingRequest, RatingView};

impl From<RatingError> for ApiError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::Validation(msg) => ApiError::ValidationError(msg),
            RatingError::NotFound(msg) => ApiError::NotFound(msg),
            RatingError::Forbidden(msg) => ApiError::Forbidden(msg),
            RatingError::Unauthenticated => ApiError::Unauthorized(err.to_string()),
            RatingError::Unsupported(msg) => ApiError::NotImplemented(msg),
            RatingError::ExternalDependency { service, message } => {
                ApiError::ExternalApiError { service, message }
            }
            RatingError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

/// POST /ratings
pub async fn upsert_rating(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<RatingBody>,
) -> Result<Json<ApiResponse<RatingView>>, ApiError> {
    let request = RatingRequest {
        tmdb_id: validate_tmdb_id(body.tmdb_id)?,
        kind: parse_media_kind(&body.media_type)?,
        score: body.rating,
        review: body.review,
        is_spoiler: body.is_spoiler,
    };

    let view = state.rating_service().upsert(user.id, request).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// GET /ratings/my-ratings
pub async fn my_ratings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<RatingView>>>, ApiError> {
    let (page, page_size) = validate_page(query.page, query.page_size)?;

    let ratings = state
        .rating_service()
        .list_for_user(user.id, page, page_size)
        .await?;

    Ok(Json(ApiResponse::success(ratings)))
}

/// GET /ratings/my-rating/{tmdb_id}/{media_type}
pub async fn my_rating(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((tmdb_id, media_type)): Path<(i32, String)>,
) -> Result<Json<ApiResponse<RatingView>>, ApiError> {
    let tmdb_id = validate_tmdb_id(tmdb_id)?;
    let kind = parse_media_kind(&media_type)?;

    let rating = state
        .rating_service()
        .get_for_user_and_media(user.id, tmdb_id, kind)
        .await?
        .ok_or_else(|| ApiError::NotFound("No rating found".to_string()))?;

    Ok(Json(ApiResponse::success(rating)))
}

/// GET /ratings/media/{tmdb_id}/{media_type}
pub async fn media_stats(
    State(state): State<Arc<AppState>>,
    Path((tmdb_id, media_type)): Path<(i32, String)>,
) -> Result<Json<ApiResponse<MediaRatingStats>>, ApiError> {
    let tmdb_id = validate_tmdb_id(tmdb_id)?;
    let kind = parse_media_kind(&media_type)?;

    let stats = state.rating_service().stats_for(tmdb_id, kind).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// DELETE /ratings/{rating_id}
pub async fn delete_rating(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rating_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedDto>>, ApiError> {
    let deleted = state.rating_service().delete(rating_id, user.id).await?;

    if !deleted {
        return Err(ApiError::not_found("Rating", rating_id));
    }

    Ok(Json(ApiResponse::success(DeletedDto {
        deleted,
        rating_id,
    })))
}
