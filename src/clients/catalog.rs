//! Catalog-neutral view of external media metadata.
//!
//! The resolver only depends on [`Catalog`], so tests and alternative
//! providers can stand in for TMDb.

use serde::Serialize;
use thiserror::Error;

use crate::domain::MediaKind;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no handler for this kind.
    #[error("{0} lookups are not supported by this catalog")]
    Unsupported(MediaKind),

    #[error("{kind} {tmdb_id} does not exist in the catalog")]
    NotFound { tmdb_id: i32, kind: MediaKind },

    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Transport(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Country {
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KindDetails {
    Film {
        runtime: Option<i32>,
        budget: Option<i64>,
        revenue: Option<i64>,
    },
    Series {
        number_of_seasons: Option<i32>,
        number_of_episodes: Option<i32>,
        last_air_date: Option<String>,
    },
}

/// Full details for one catalog item. Strings are passed through untouched;
/// normalization happens when the row is built.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDetails {
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    /// `release_date` for films, `first_air_date` for series.
    pub date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub popularity: Option<f64>,
    pub original_language: Option<String>,
    pub genres: Vec<Genre>,
    pub production_countries: Vec<Country>,
    pub imdb_id: Option<String>,
    pub adult: bool,
    pub tagline: Option<String>,
    pub homepage: Option<String>,
    pub status: Option<String>,
    pub kind: KindDetails,
}

#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Fetches full details for one item.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Unsupported`] when the kind has no handler,
    /// [`CatalogError::NotFound`] for unknown ids and
    /// [`CatalogError::Transport`] for any other failure.
    async fn fetch_details(&self, tmdb_id: i32, kind: MediaKind)
    -> Result<MediaDetails, CatalogError>;
}
