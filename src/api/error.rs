use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use thiserror::Error;

use super::ApiResponse;
use crate::domain::DomainError;

/// Every failure a handler can return. Server-side variants keep their detail
/// for the log and answer with a generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("{service} error: {message}")]
    ExternalApiError { service: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::ExternalApiError { .. } => StatusCode::BAD_GATEWAY,
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text placed in the response body.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::ValidationError(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::Conflict(msg)
            | Self::NotImplemented(msg) => msg.clone(),
            Self::ExternalApiError { service, .. } => format!("{service} service is unavailable"),
            Self::DatabaseError(_) => "A database error occurred".to_string(),
            Self::InternalError(_) => "An internal error occurred".to_string(),
        }
    }

    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn tmdb_error(msg: impl Into<String>) -> Self {
        Self::ExternalApiError {
            service: "TMDb".to_string(),
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::DatabaseError(_) | Self::InternalError(_) => tracing::error!(error = %self),
            Self::ExternalApiError { .. } => tracing::warn!(error = %self, "Upstream call failed"),
            _ => {}
        }

        let body = ApiResponse::<()>::error(self.public_message());
        (self.status(), Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_hide_detail() {
        let err = ApiError::DatabaseError("disk I/O error at /var/lib/cinelog.db".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "A database error occurred");

        let err = ApiError::tmdb_error("401 Unauthorized: invalid api_key");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.public_message(), "TMDb service is unavailable");
    }

    #[test]
    fn test_client_errors_keep_reason() {
        let err = ApiError::from(DomainError::ReviewTooLong);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Review cannot exceed 2000 characters");

        assert_eq!(
            ApiError::not_found("Rating", 7).public_message(),
            "Rating 7 not found"
        );
        assert_eq!(
            ApiError::Forbidden(String::new()).status(),
            StatusCode::FORBIDDEN
        );
    }
}
