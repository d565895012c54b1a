//! `SeaORM` implementation of the `MediaResolver` trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::clients::{Catalog, KindDetails, MediaDetails};
use crate::db::{Materialized, MediaRecord, MediaSlot, Store};
use crate::domain::MediaKind;
use crate::entities::media;
use crate::services::media_service::{MediaError, MediaResolver};

pub struct SeaOrmMediaResolver {
    store: Store,
    catalog: Arc<dyn Catalog>,
}

impl SeaOrmMediaResolver {
    #[must_use]
    pub fn new(store: Store, catalog: Arc<dyn Catalog>) -> Self {
        Self { store, catalog }
    }

    async fn fetch_record(&self, tmdb_id: i32, kind: MediaKind) -> Result<MediaRecord, MediaError> {
        info!(tmdb_id, %kind, "Fetching media from catalog");
        let details = self.catalog.fetch_details(tmdb_id, kind).await?;
        Ok(map_details(kind, details))
    }
}

fn validate_tmdb_id(tmdb_id: i32) -> Result<i32, MediaError> {
    if tmdb_id <= 0 {
        return Err(MediaError::Validation(format!(
            "Invalid TMDb ID: {tmdb_id}. ID must be a positive integer"
        )));
    }
    Ok(tmdb_id)
}

pub(crate) fn record_resolution(kind: MediaKind, outcome: Materialized) {
    metrics::counter!(
        "media_resolved_total",
        "kind" => kind.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

#[async_trait]
impl MediaResolver for SeaOrmMediaResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, tmdb_id: i32, kind: MediaKind) -> Result<media::Model, MediaError> {
        let slot = self.locate(tmdb_id, kind).await?;
        let (model, outcome) = self.store.materialize_media(slot).await?;
        record_resolution(kind, outcome);

        match outcome {
            Materialized::AlreadyCached => {}
            Materialized::Inserted => {
                info!(media_id = %model.id, title = %model.title, "Created media row");
            }
            Materialized::LostRace => {
                info!(media_id = %model.id, "Media row created concurrently, using existing row");
            }
        }

        Ok(model)
    }

    async fn locate(&self, tmdb_id: i32, kind: MediaKind) -> Result<MediaSlot, MediaError> {
        let tmdb_id = validate_tmdb_id(tmdb_id)?;

        if let Some(existing) = self.store.find_media(tmdb_id, kind).await? {
            return Ok(MediaSlot::Cached(existing));
        }

        let record = self.fetch_record(tmdb_id, kind).await?;
        Ok(MediaSlot::Fetched {
            tmdb_id,
            kind,
            record,
        })
    }

    async fn find(
        &self,
        tmdb_id: i32,
        kind: MediaKind,
    ) -> Result<Option<media::Model>, MediaError> {
        let tmdb_id = validate_tmdb_id(tmdb_id)?;
        Ok(self.store.find_media(tmdb_id, kind).await?)
    }

    #[instrument(skip(self))]
    async fn refresh(&self, tmdb_id: i32, kind: MediaKind) -> Result<media::Model, MediaError> {
        let tmdb_id = validate_tmdb_id(tmdb_id)?;

        let Some(existing) = self.store.find_media(tmdb_id, kind).await? else {
            return self.resolve(tmdb_id, kind).await;
        };

        let record = self.fetch_record(tmdb_id, kind).await?;
        let updated = self.store.overwrite_media(existing, record).await?;
        info!(media_id = %updated.id, "Refreshed media row from catalog");
        Ok(updated)
    }
}

/// Builds the stored representation of catalog details.
///
/// Text is trimmed with blanks dropped, dates that fail to parse become
/// `None`, and genre/country lists are stored as JSON arrays.
#[must_use]
pub fn map_details(kind: MediaKind, details: MediaDetails) -> MediaRecord {
    let title = clean(details.title).unwrap_or_else(|| kind.placeholder_title().to_string());

    let genres = (!details.genres.is_empty())
        .then(|| serde_json::to_string(&details.genres).ok())
        .flatten();
    let production_countries = (!details.production_countries.is_empty())
        .then(|| serde_json::to_string(&details.production_countries).ok())
        .flatten();

    let mut record = MediaRecord {
        title,
        original_title: clean(details.original_title),
        overview: clean(details.overview),
        release_date: details.date.as_deref().and_then(parse_date),
        poster_path: clean(details.poster_path),
        backdrop_path: clean(details.backdrop_path),
        genres,
        vote_average: details.vote_average,
        vote_count: details.vote_count,
        popularity: details.popularity,
        original_language: clean(details.original_language),
        production_countries,
        imdb_id: clean(details.imdb_id),
        adult: details.adult,
        tagline: clean(details.tagline),
        homepage: clean(details.homepage),
        status: clean(details.status),
        ..MediaRecord::default()
    };

    match details.kind {
        KindDetails::Film {
            runtime,
            budget,
            revenue,
        } => {
            record.runtime = runtime;
            record.budget = budget;
            record.revenue = revenue;
        }
        KindDetails::Series {
            number_of_seasons,
            number_of_episodes,
            last_air_date,
        } => {
            record.number_of_seasons = number_of_seasons;
            record.number_of_episodes = number_of_episodes;
            record.last_air_date = last_air_date.as_deref().and_then(parse_date);
        }
    }

    record
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{Country, Genre};

    fn film_details() -> MediaDetails {
        MediaDetails {
            title: Some("  Fight Club ".to_string()),
            original_title: Some(String::new()),
            overview: None,
            date: Some("1999-10-15".to_string()),
            poster_path: Some("/poster.jpg".to_string()),
            backdrop_path: None,
            vote_average: Some(8.4),
            vote_count: Some(1000),
            popularity: None,
            original_language: Some("en".to_string()),
            genres: vec![Genre {
                id: 18,
                name: "Drama".to_string(),
            }],
            production_countries: vec![Country {
                iso_3166_1: "US".to_string(),
                name: "United States of America".to_string(),
            }],
            imdb_id: Some("tt0137523".to_string()),
            adult: false,
            tagline: None,
            homepage: None,
            status: Some("Released".to_string()),
            kind: KindDetails::Film {
                runtime: Some(139),
                budget: Some(63_000_000),
                revenue: None,
            },
        }
    }

    #[test]
    fn test_map_details_trims_and_serializes() {
        let record = map_details(MediaKind::Film, film_details());
        assert_eq!(record.title, "Fight Club");
        assert_eq!(record.original_title, None);
        assert_eq!(
            record.release_date,
            NaiveDate::from_ymd_opt(1999, 10, 15)
        );
        assert_eq!(record.genres.as_deref(), Some(r#"[{"id":18,"name":"Drama"}]"#));
        assert_eq!(
            record.production_countries.as_deref(),
            Some(r#"[{"iso_3166_1":"US","name":"United States of America"}]"#)
        );
        assert_eq!(record.runtime, Some(139));
    }

    #[test]
    fn test_map_details_fallbacks() {
        let mut details = film_details();
        details.title = None;
        details.date = Some("sometime in 1999".to_string());
        details.genres.clear();

        let record = map_details(MediaKind::Film, details.clone());
        assert_eq!(record.title, "Unknown Title");
        assert_eq!(record.release_date, None);
        assert_eq!(record.genres, None);

        details.kind = KindDetails::Series {
            number_of_seasons: Some(2),
            number_of_episodes: Some(20),
            last_air_date: Some("2020-01-01T00:00:00Z".to_string()),
        };
        let record = map_details(MediaKind::Series, details);
        assert_eq!(record.title, "Unknown Series");
        assert_eq!(record.number_of_seasons, Some(2));
        assert_eq!(record.last_air_date, NaiveDate::from_ymd_opt(2020, 1, 1));
    }
}
