use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::MediaKind;
use crate::entities::media;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Rating submission body. Older clients send `externalId`/`kind`/`score`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBody {
    #[serde(alias = "externalId")]
    pub tmdb_id: i32,
    #[serde(alias = "kind")]
    pub media_type: String,
    #[serde(alias = "score")]
    pub rating: f64,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub is_spoiler: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedDto {
    pub deleted: bool,
    pub rating_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCountDto {
    pub user_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingQuery {
    pub time_window: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    pub year: Option<i32>,
    pub genre: Option<i32>,
    pub page: Option<u32>,
}

/// A cached media row as rendered by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDto {
    pub id: Uuid,
    pub tmdb_id: i32,
    pub media_type: MediaKind,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub genres: serde_json::Value,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub popularity: Option<f64>,
    pub original_language: Option<String>,
    pub production_countries: serde_json::Value,
    pub imdb_id: Option<String>,
    pub adult: bool,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub tagline: Option<String>,
    pub homepage: Option<String>,
    pub status: Option<String>,
    pub number_of_seasons: Option<i32>,
    pub number_of_episodes: Option<i32>,
    pub last_air_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn json_list(raw: Option<&str>) -> serde_json::Value {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()))
}

impl From<media::Model> for MediaDto {
    fn from(m: media::Model) -> Self {
        Self {
            genres: json_list(m.genres.as_deref()),
            production_countries: json_list(m.production_countries.as_deref()),
            id: m.id,
            tmdb_id: m.tmdb_id,
            media_type: m.media_type,
            title: m.title,
            original_title: m.original_title,
            overview: m.overview,
            release_date: m.release_date,
            poster_path: m.poster_path,
            backdrop_path: m.backdrop_path,
            runtime: m.runtime,
            vote_average: m.vote_average,
            vote_count: m.vote_count,
            popularity: m.popularity,
            original_language: m.original_language,
            imdb_id: m.imdb_id,
            adult: m.adult,
            budget: m.budget,
            revenue: m.revenue,
            tagline: m.tagline,
            homepage: m.homepage,
            status: m.status,
            number_of_seasons: m.number_of_seasons,
            number_of_episodes: m.number_of_episodes,
            last_air_date: m.last_air_date,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
