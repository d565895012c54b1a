use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod catalog;
mod error;
mod media;
mod observability;
mod ratings;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use crate::clients::TmdbClient;
use crate::services::{AuthService, MediaResolver, RatingService};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn tmdb(&self) -> &Arc<TmdbClient> {
        &self.shared.tmdb
    }

    #[must_use]
    pub fn media_resolver(&self) -> &Arc<dyn MediaResolver> {
        &self.shared.media_resolver
    }

    #[must_use]
    pub fn rating_service(&self) -> &Arc<dyn RatingService> {
        &self.shared.rating_service
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, request_timeout) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            Duration::from_secs(config.server.request_timeout_seconds),
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/health", get(observability::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/ratings/media/{tmdb_id}/{media_type}", get(ratings::media_stats))
        .route("/users/count", get(users::count_users))
        .route("/movies/search", get(catalog::search_movies))
        .route("/movies/trending", get(catalog::trending_movies))
        .route("/movies/discover", get(catalog::discover_movies))
        .route("/movies/{id}", get(catalog::get_movie))
        .route("/tv/search", get(catalog::search_tv))
        .route("/tv/trending", get(catalog::trending_tv))
        .route("/tv/discover", get(catalog::discover_tv))
        .route("/tv/{id}", get(catalog::get_tv_show))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    // Timeout drops the handler future, rolling back any open transaction.
    Router::new()
        .nest("/api", api_router)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/ratings", post(ratings::upsert_rating))
        .route("/ratings/my-ratings", get(ratings::my_ratings))
        .route(
            "/ratings/my-rating/{tmdb_id}/{media_type}",
            get(ratings::my_rating),
        )
        .route("/ratings/{rating_id}", delete(ratings::delete_rating))
        .route(
            "/media/{media_type}/{tmdb_id}/refresh",
            post(media::refresh_media),
        )
        .route("/users", get(users::list_users))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
