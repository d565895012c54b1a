//! Domain service for ratings and their per-media aggregates.
//!
//! Every operation takes the acting user id explicitly; the HTTP layer is
//! responsible for establishing it.

use chrono::{DateTime, Utc};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{DomainError, MediaKind};
use crate::services::media_service::MediaError;

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("User not authenticated")]
    Unauthenticated,

    #[error("{0}")]
    Unsupported(String),

    #[error("{service} error: {message}")]
    ExternalDependency { service: String, message: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<MediaError> for RatingError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Validation(msg) => Self::Validation(msg),
            MediaError::Unsupported(msg) => Self::Unsupported(msg),
            MediaError::ExternalDependency { service, message } => {
                Self::ExternalDependency { service, message }
            }
            MediaError::Database(msg) => Self::Database(msg),
        }
    }
}

impl From<DomainError> for RatingError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<anyhow::Error> for RatingError {
    fn from(err: anyhow::Error) -> Self {
        // A rating written for a user id that no longer exists.
        if let Some(db_err) = err.downcast_ref::<DbErr>()
            && matches!(db_err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
        {
            return Self::Unauthenticated;
        }
        Self::Database(format!("{err:#}"))
    }
}

/// A rating submission, already parsed at the boundary.
#[derive(Debug, Clone)]
pub struct RatingRequest {
    pub tmdb_id: i32,
    pub kind: MediaKind,
    pub score: f64,
    pub review: Option<String>,
    pub is_spoiler: bool,
}

/// A rating joined with display fields of its author and media.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_id: Uuid,
    pub rating: f64,
    pub review: Option<String>,
    pub is_spoiler: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub user_avatar_url: Option<String>,
    pub media_title: String,
    pub media_poster_url: Option<String>,
    pub media_type: Option<MediaKind>,
    pub tmdb_id: Option<i32>,
    pub star_rating: String,
    pub has_review: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRatingStats {
    pub media_id: Uuid,
    pub tmdb_id: i32,
    pub media_title: String,
    pub media_type: MediaKind,
    pub average_rating: f64,
    pub total_ratings: u32,
    pub five_star_ratings: u32,
    pub four_star_ratings: u32,
    pub three_star_ratings: u32,
    pub two_star_ratings: u32,
    pub one_star_ratings: u32,
    pub recent_ratings: Vec<RatingView>,
}

/// Domain service trait for ratings.
#[async_trait::async_trait]
pub trait RatingService: Send + Sync {
    /// Creates or updates `user_id`'s rating for the requested media,
    /// resolving the media row first.
    ///
    /// # Errors
    ///
    /// [`RatingError::Validation`] for a bad score or review, before any
    /// catalog call. Media resolution errors propagate unchanged.
    async fn upsert(&self, user_id: Uuid, request: RatingRequest)
    -> Result<RatingView, RatingError>;

    /// Deletes a rating owned by `user_id`. Returns `false` when no rating
    /// has that id.
    ///
    /// # Errors
    ///
    /// [`RatingError::Forbidden`] when the rating belongs to someone else.
    async fn delete(&self, rating_id: Uuid, user_id: Uuid) -> Result<bool, RatingError>;

    /// Media that was never cached counts as unrated.
    async fn get_for_user_and_media(
        &self,
        user_id: Uuid,
        tmdb_id: i32,
        kind: MediaKind,
    ) -> Result<Option<RatingView>, RatingError>;

    /// A page of the user's ratings, newest first. `page` is 1-based.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<RatingView>, RatingError>;

    /// Recomputes aggregates from every stored rating of the media.
    ///
    /// # Errors
    ///
    /// [`RatingError::NotFound`] when the media is not cached locally.
    async fn stats_for(&self, tmdb_id: i32, kind: MediaKind)
    -> Result<MediaRatingStats, RatingError>;
}
