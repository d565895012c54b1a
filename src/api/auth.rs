use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, ChangePasswordRequest, LoginRequest, MessageDto,
};
use crate::services::{AuthError, AuthSession, AuthUser, Registration, UserProfile};

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::UserNotFound => ApiError::NotFound("User not found".to_string()),
            AuthError::Conflict(msg) => ApiError::Conflict(msg),
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Requires `Authorization: Bearer <jwt>` and stores the caller as an
/// [`AuthUser`] request extension.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(&headers) else {
        return ApiError::unauthorized("User not authenticated").into_response();
    };

    match state.auth_service().authenticate(token) {
        Ok(user) => {
            tracing::Span::current().record("user_id", tracing::field::display(user.id));
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Registration>,
) -> Result<(StatusCode, Json<ApiResponse<AuthSession>>), ApiError> {
    let session = state.auth_service().register(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(session))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthSession>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let session = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(session)))
}

/// POST /auth/logout
/// Tokens are stateless; the client discards its copy.
pub async fn logout(Extension(user): Extension<AuthUser>) -> Json<ApiResponse<MessageDto>> {
    tracing::info!(user_id = %user.id, "User logged out");
    Json(ApiResponse::success(MessageDto {
        message: "Logged out successfully".to_string(),
    }))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let profile = state.auth_service().me(user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    state
        .auth_service()
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageDto {
        message: "Password updated successfully".to_string(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
