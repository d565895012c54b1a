//! Read-only pass-through to TMDb for browsing titles before rating them.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::{validate_search_query, validate_time_window, validate_tmdb_id};
use super::{ApiError, ApiResponse, AppState, DiscoverQuery, SearchQuery, TrendingQuery};
use crate::clients::tmdb::{TmdbMovieDetails, TmdbSearchResponse, TmdbTvDetails};
use crate::domain::MediaKind;

type Listing = Json<ApiResponse<TmdbSearchResponse>>;

fn upstream(err: &anyhow::Error) -> ApiError {
    ApiError::tmdb_error(format!("{err:#}"))
}

fn page_or_default(page: Option<u32>) -> Result<u32, ApiError> {
    match page.unwrap_or(1) {
        0 => Err(ApiError::validation("Page must be at least 1")),
        page => Ok(page),
    }
}

async fn search(state: &AppState, kind: MediaKind, query: SearchQuery) -> Result<Listing, ApiError> {
    let term = validate_search_query(&query.query)?;
    let page = page_or_default(query.page)?;

    let results = state
        .tmdb()
        .search(kind, term, page)
        .await
        .map_err(|e| upstream(&e))?;

    Ok(Json(ApiResponse::success(results)))
}

async fn trending(
    state: &AppState,
    kind: MediaKind,
    query: TrendingQuery,
) -> Result<Listing, ApiError> {
    let window = validate_time_window(query.time_window.as_deref())?;

    let results = state
        .tmdb()
        .trending(kind, window)
        .await
        .map_err(|e| upstream(&e))?;

    Ok(Json(ApiResponse::success(results)))
}

async fn discover(
    state: &AppState,
    kind: MediaKind,
    query: DiscoverQuery,
) -> Result<Listing, ApiError> {
    let page = page_or_default(query.page)?;
    let genre = query.genre.map(|g| g.to_string());

    let results = state
        .tmdb()
        .discover(kind, query.year, genre.as_deref(), page)
        .await
        .map_err(|e| upstream(&e))?;

    Ok(Json(ApiResponse::success(results)))
}

/// GET /movies/search
pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Listing, ApiError> {
    search(&state, MediaKind::Film, query).await
}

/// GET /movies/trending
pub async fn trending_movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendingQuery>,
) -> Result<Listing, ApiError> {
    trending(&state, MediaKind::Film, query).await
}

/// GET /movies/discover
pub async fn discover_movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Listing, ApiError> {
    discover(&state, MediaKind::Film, query).await
}

/// GET /movies/{id}
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TmdbMovieDetails>>, ApiError> {
    let id = validate_tmdb_id(id)?;

    let movie = state
        .tmdb()
        .movie_details(id)
        .await
        .map_err(|e| upstream(&e))?
        .ok_or_else(|| ApiError::not_found("Movie", id))?;

    Ok(Json(ApiResponse::success(movie)))
}

/// GET /tv/search
pub async fn search_tv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Listing, ApiError> {
    search(&state, MediaKind::Series, query).await
}

/// GET /tv/trending
pub async fn trending_tv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendingQuery>,
) -> Result<Listing, ApiError> {
    trending(&state, MediaKind::Series, query).await
}

/// GET /tv/discover
pub async fn discover_tv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Listing, ApiError> {
    discover(&state, MediaKind::Series, query).await
}

/// GET /tv/{id}
pub async fn get_tv_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TmdbTvDetails>>, ApiError> {
    let id = validate_tmdb_id(id)?;

    let show = state
        .tmdb()
        .tv_details(id)
        .await
        .map_err(|e| upstream(&e))?
        .ok_or_else(|| ApiError::not_found("TV show", id))?;

    Ok(Json(ApiResponse::success(show)))
}
