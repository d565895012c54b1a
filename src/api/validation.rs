use super::ApiError;
use crate::domain::MediaKind;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const MAX_PAGE: u64 = 100_000;

pub fn validate_tmdb_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid TMDb ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Accepts `movie`/`film` and `tv`/`series`/`show`, case-insensitively.
pub fn parse_media_kind(raw: &str) -> Result<MediaKind, ApiError> {
    raw.parse::<MediaKind>().map_err(|_| {
        ApiError::validation(format!("Invalid media type: '{raw}'. Expected 'movie' or 'tv'"))
    })
}

/// Returns `(page, page_size)` with defaults applied.
pub fn validate_page(page: Option<u64>, page_size: Option<u64>) -> Result<(u64, u64), ApiError> {
    let page = page.unwrap_or(1);
    if !(1..=MAX_PAGE).contains(&page) {
        return Err(ApiError::validation(format!(
            "Invalid page: {page}. Page must be between 1 and {MAX_PAGE}"
        )));
    }

    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiError::validation(format!(
            "Invalid page size: {page_size}. Page size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    Ok((page, page_size))
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Search query is required"));
    }
    Ok(trimmed)
}

pub fn validate_time_window(window: Option<&str>) -> Result<&str, ApiError> {
    match window.map(str::trim).filter(|w| !w.is_empty()) {
        None => Ok("week"),
        Some(w) if w.eq_ignore_ascii_case("day") => Ok("day"),
        Some(w) if w.eq_ignore_ascii_case("week") => Ok("week"),
        Some(w) => Err(ApiError::validation(format!(
            "Invalid time window: '{w}'. Expected 'day' or 'week'"
        ))),
    }
}
