use anyhow::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::catalog::{Catalog, CatalogError, Country, Genre, KindDetails, MediaDetails};
use crate::config::TmdbConfig;
use crate::domain::MediaKind;

const TMDB_API: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbSearchResponse {
    pub page: i32,
    pub results: Vec<TmdbMediaItem>,
    pub total_pages: i32,
    pub total_results: i32,
}

/// Search/trending/discover entry. Films carry `title`, series carry `name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbMediaItem {
    pub id: i32,
    pub title: Option<String>,
    pub name: Option<String>,
    pub original_title: Option<String>,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f64,
    pub vote_count: i32,
    pub popularity: f64,
    pub genre_ids: Vec<i32>,
    pub adult: bool,
    pub original_language: Option<String>,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbGenre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbProductionCountry {
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbMovieDetails {
    pub id: i32,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f64,
    pub vote_count: i32,
    pub popularity: f64,
    pub adult: bool,
    pub original_language: Option<String>,
    pub imdb_id: Option<String>,
    pub runtime: Option<i32>,
    pub budget: i64,
    pub revenue: i64,
    pub genres: Vec<TmdbGenre>,
    pub production_countries: Vec<TmdbProductionCountry>,
    pub tagline: Option<String>,
    pub homepage: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbTvDetails {
    pub id: i32,
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f64,
    pub vote_count: i32,
    pub popularity: f64,
    pub adult: bool,
    pub original_language: Option<String>,
    pub number_of_episodes: Option<i32>,
    pub number_of_seasons: Option<i32>,
    pub genres: Vec<TmdbGenre>,
    pub production_countries: Vec<TmdbProductionCountry>,
    pub tagline: Option<String>,
    pub homepage: Option<String>,
    pub status: Option<String>,
    pub in_production: bool,
    #[serde(rename = "type")]
    pub show_type: Option<String>,
}

fn genres(list: Vec<TmdbGenre>) -> Vec<Genre> {
    list.into_iter()
        .map(|g| Genre {
            id: g.id,
            name: g.name,
        })
        .collect()
}

fn countries(list: Vec<TmdbProductionCountry>) -> Vec<Country> {
    list.into_iter()
        .map(|c| Country {
            iso_3166_1: c.iso_3166_1,
            name: c.name,
        })
        .collect()
}

impl From<TmdbMovieDetails> for MediaDetails {
    fn from(movie: TmdbMovieDetails) -> Self {
        Self {
            title: movie.title,
            original_title: movie.original_title,
            overview: movie.overview,
            date: movie.release_date,
            poster_path: movie.poster_path,
            backdrop_path: movie.backdrop_path,
            vote_average: Some(movie.vote_average),
            vote_count: Some(movie.vote_count),
            popularity: Some(movie.popularity),
            original_language: movie.original_language,
            genres: genres(movie.genres),
            production_countries: countries(movie.production_countries),
            imdb_id: movie.imdb_id,
            adult: movie.adult,
            tagline: movie.tagline,
            homepage: movie.homepage,
            status: movie.status,
            kind: KindDetails::Film {
                runtime: movie.runtime,
                budget: Some(movie.budget),
                revenue: Some(movie.revenue),
            },
        }
    }
}

impl From<TmdbTvDetails> for MediaDetails {
    fn from(show: TmdbTvDetails) -> Self {
        Self {
            title: show.name,
            original_title: show.original_name,
            overview: show.overview,
            date: show.first_air_date,
            poster_path: show.poster_path,
            backdrop_path: show.backdrop_path,
            vote_average: Some(show.vote_average),
            vote_count: Some(show.vote_count),
            popularity: Some(show.popularity),
            original_language: show.original_language,
            genres: genres(show.genres),
            production_countries: countries(show.production_countries),
            imdb_id: None,
            adult: show.adult,
            tagline: show.tagline,
            homepage: show.homepage,
            status: show.status,
            kind: KindDetails::Series {
                number_of_seasons: show.number_of_seasons,
                number_of_episodes: show.number_of_episodes,
                last_air_date: show.last_air_date,
            },
        }
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Self {
        let client = Client::builder()
            .user_agent("CineLog/1.0")
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_shared_client(client, config)
    }

    #[must_use]
    pub fn with_shared_client(client: Client, config: &TmdbConfig) -> Self {
        let base_url = if config.base_url.is_empty() {
            TMDB_API.to_string()
        } else {
            config.base_url.trim_end_matches('/').to_string()
        };

        Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        }
    }

    /// GET `{base}/{path}` with the api key appended. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let mut url = url::Url::parse(&format!("{}/{}", self.base_url, path))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api_key", &self.api_key);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        debug!(path, "TMDb request");

        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("TMDb API error: {status} - {body}"));
        }

        Ok(Some(response.json().await?))
    }

    async fn get_listing(&self, path: &str, query: &[(&str, String)]) -> Result<TmdbSearchResponse> {
        Ok(self.get_json(path, query).await?.unwrap_or_default())
    }

    pub async fn search(&self, kind: MediaKind, query: &str, page: u32) -> Result<TmdbSearchResponse> {
        let path = format!("search/{}", kind.as_str());
        self.get_listing(
            &path,
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    pub async fn trending(&self, kind: MediaKind, time_window: &str) -> Result<TmdbSearchResponse> {
        let path = format!("trending/{}/{time_window}", kind.as_str());
        self.get_listing(&path, &[]).await
    }

    pub async fn discover(
        &self,
        kind: MediaKind,
        year: Option<i32>,
        genre: Option<&str>,
        page: u32,
    ) -> Result<TmdbSearchResponse> {
        let mut query = vec![("page", page.to_string())];
        if let Some(year) = year {
            let key = match kind {
                MediaKind::Film => "primary_release_year",
                MediaKind::Series => "first_air_date_year",
            };
            query.push((key, year.to_string()));
        }
        if let Some(genre) = genre.filter(|g| !g.is_empty()) {
            query.push(("with_genres", genre.to_string()));
        }

        let path = format!("discover/{}", kind.as_str());
        self.get_listing(&path, &query).await
    }

    pub async fn movie_details(&self, id: i32) -> Result<Option<TmdbMovieDetails>> {
        self.get_json(&format!("movie/{id}"), &[]).await
    }

    pub async fn tv_details(&self, id: i32) -> Result<Option<TmdbTvDetails>> {
        self.get_json(&format!("tv/{id}"), &[]).await
    }
}

#[async_trait::async_trait]
impl Catalog for TmdbClient {
    async fn fetch_details(
        &self,
        tmdb_id: i32,
        kind: MediaKind,
    ) -> Result<MediaDetails, CatalogError> {
        let details = match kind {
            MediaKind::Film => self.movie_details(tmdb_id).await?.map(MediaDetails::from),
            MediaKind::Series => self.tv_details(tmdb_id).await?.map(MediaDetails::from),
        };

        details.ok_or_else(|| {
            warn!(tmdb_id, %kind, "TMDb has no such item");
            CatalogError::NotFound { tmdb_id, kind }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_details_deserialize_and_map() {
        let json = r#"{
            "id": 550,
            "title": "Fight Club",
            "release_date": "1999-10-15",
            "runtime": 139,
            "budget": 63000000,
            "vote_average": 8.4,
            "genres": [{"id": 18, "name": "Drama"}],
            "production_countries": [{"iso_3166_1": "US", "name": "United States of America"}]
        }"#;

        let movie: TmdbMovieDetails = serde_json::from_str(json).unwrap();
        let details = MediaDetails::from(movie);

        assert_eq!(details.title.as_deref(), Some("Fight Club"));
        assert_eq!(details.date.as_deref(), Some("1999-10-15"));
        assert_eq!(details.genres.len(), 1);
        assert_eq!(details.production_countries[0].iso_3166_1, "US");
        assert!(matches!(
            details.kind,
            KindDetails::Film {
                runtime: Some(139),
                ..
            }
        ));
    }

    #[test]
    fn test_tv_details_use_name_fields() {
        let json = r#"{
            "id": 1399,
            "name": "Game of Thrones",
            "first_air_date": "2011-04-17",
            "number_of_seasons": 8,
            "type": "Scripted"
        }"#;

        let show: TmdbTvDetails = serde_json::from_str(json).unwrap();
        assert_eq!(show.show_type.as_deref(), Some("Scripted"));

        let details = MediaDetails::from(show);
        assert_eq!(details.title.as_deref(), Some("Game of Thrones"));
        assert!(matches!(
            details.kind,
            KindDetails::Series {
                number_of_seasons: Some(8),
                ..
            }
        ));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let config = TmdbConfig {
            base_url: "http://localhost:9999/3/".to_string(),
            ..TmdbConfig::default()
        };
        let client = TmdbClient::new(&config);
        assert_eq!(client.base_url, "http://localhost:9999/3");
    }
}
