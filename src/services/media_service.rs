//! Media resolution: maps a catalog id and kind to a local media row.
//!
//! The media table is a write-once cache of catalog data. Rows are created on
//! first use and only change through an explicit [`MediaResolver::refresh`].

use thiserror::Error;

use crate::clients::CatalogError;
use crate::db::MediaSlot;
use crate::domain::{DomainError, MediaKind};
use crate::entities::media;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("{service} error: {message}")]
    ExternalDependency { service: String, message: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl MediaError {
    pub fn tmdb(message: impl Into<String>) -> Self {
        Self::ExternalDependency {
            service: "TMDb".to_string(),
            message: message.into(),
        }
    }
}

impl From<CatalogError> for MediaError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Unsupported(_) => Self::Unsupported(err.to_string()),
            CatalogError::NotFound { .. } | CatalogError::Transport(_) => {
                Self::tmdb(err.to_string())
            }
        }
    }
}

impl From<DomainError> for MediaError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<anyhow::Error> for MediaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait MediaResolver: Send + Sync {
    /// Returns the local row for `(tmdb_id, kind)`, creating it from the
    /// catalog on a miss. A hit performs no writes.
    ///
    /// # Errors
    ///
    /// [`MediaError::Unsupported`] or [`MediaError::ExternalDependency`] when
    /// the catalog cannot supply details; nothing is written in that case.
    async fn resolve(&self, tmdb_id: i32, kind: MediaKind) -> Result<media::Model, MediaError>;

    /// Looks the row up and, on a miss, fetches and maps catalog details
    /// without writing them. The caller decides which transaction the
    /// insert joins.
    async fn locate(&self, tmdb_id: i32, kind: MediaKind) -> Result<MediaSlot, MediaError>;

    /// Local lookup only.
    async fn find(&self, tmdb_id: i32, kind: MediaKind)
    -> Result<Option<media::Model>, MediaError>;

    /// Re-fetches catalog details and overwrites the stored row. Behaves as
    /// [`MediaResolver::resolve`] when no row exists yet.
    async fn refresh(&self, tmdb_id: i32, kind: MediaKind) -> Result<media::Model, MediaError>;
}
