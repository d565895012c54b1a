use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::domain::MediaKind;
use crate::entities::media;

/// Descriptive fields of a media row, already normalized for storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaRecord {
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub genres: Option<String>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub popularity: Option<f64>,
    pub original_language: Option<String>,
    pub production_countries: Option<String>,
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
}

impl MediaRecord {
    /// Writes every descriptive column; the row's identity columns are untouched.
    fn apply(self, active: &mut media::ActiveModel) {
        active.title = Set(self.title);
        active.original_title = Set(self.original_title);
        active.overview = Set(self.overview);
        active.release_date = Set(self.release_date);
        active.poster_path = Set(self.poster_path);
        active.backdrop_path = Set(self.backdrop_path);
        active.genres = Set(self.genres);
        active.runtime = Set(self.runtime);
        active.vote_average = Set(self.vote_average);
        active.vote_count = Set(self.vote_count);
        active.popularity = Set(self.popularity);
        active.original_language = Set(self.original_language);
        active.production_countries = Set(self.production_countries);
        active.imdb_id = Set(self.imdb_id);
        active.adult = Set(self.adult);
        active.budget = Set(self.budget);
        active.revenue = Set(self.revenue);
        active.tagline = Set(self.tagline);
        active.homepage = Set(self.homepage);
        active.status = Set(self.status);
        active.number_of_seasons = Set(self.number_of_seasons);
        active.number_of_episodes = Set(self.number_of_episodes);
        active.last_air_date = Set(self.last_air_date);
    }
}

/// A media row that either exists already or has been fetched and awaits insert.
#[derive(Debug, Clone)]
pub enum MediaSlot {
    Cached(media::Model),
    Fetched {
        tmdb_id: i32,
        kind: MediaKind,
        record: MediaRecord,
    },
}

/// Result of an insert-or-fetch on the natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    AlreadyCached,
    Inserted,
    /// A concurrent writer inserted the same natural key first.
    LostRace,
}

impl Materialized {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyCached => "hit",
            Self::Inserted => "miss",
            Self::LostRace => "race",
        }
    }
}

pub struct MediaRepository {
    conn: DatabaseConnection,
}

impl MediaRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_natural_key(
        &self,
        tmdb_id: i32,
        kind: MediaKind,
    ) -> Result<Option<media::Model>> {
        find_by_natural_key(&self.conn, tmdb_id, kind).await
    }

    pub async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<media::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        media::Entity::find()
            .filter(media::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query media by ID")
    }

    pub async fn materialize(&self, slot: MediaSlot) -> Result<(media::Model, Materialized)> {
        materialize(&self.conn, slot).await
    }

    /// Overwrites all descriptive fields of an existing row and bumps `updated_at`.
    pub async fn overwrite(&self, existing: media::Model, record: MediaRecord) -> Result<media::Model> {
        let mut active: media::ActiveModel = existing.into();
        record.apply(&mut active);
        active.updated_at = Set(Utc::now());

        active
            .update(&self.conn)
            .await
            .context("Failed to refresh media row")
    }
}

pub async fn find_by_natural_key<C: ConnectionTrait>(
    conn: &C,
    tmdb_id: i32,
    kind: MediaKind,
) -> Result<Option<media::Model>> {
    media::Entity::find()
        .filter(media::Column::TmdbId.eq(tmdb_id))
        .filter(media::Column::MediaType.eq(kind))
        .one(conn)
        .await
        .context("Failed to query media by natural key")
}

/// Insert-or-fetch on `(tmdb_id, media_type)`.
///
/// The insert uses `ON CONFLICT DO NOTHING`; zero affected rows means another
/// writer won, and the winner's row is read back and returned.
pub async fn materialize<C: ConnectionTrait>(
    conn: &C,
    slot: MediaSlot,
) -> Result<(media::Model, Materialized)> {
    let (tmdb_id, kind, record) = match slot {
        MediaSlot::Cached(model) => return Ok((model, Materialized::AlreadyCached)),
        MediaSlot::Fetched {
            tmdb_id,
            kind,
            record,
        } => (tmdb_id, kind, record),
    };

    let now = Utc::now();
    let mut active = media::ActiveModel {
        id: Set(Uuid::new_v4()),
        tmdb_id: Set(tmdb_id),
        media_type: Set(kind),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    record.apply(&mut active);

    let affected = media::Entity::insert(active)
        .on_conflict(
            OnConflict::columns([media::Column::TmdbId, media::Column::MediaType])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .context("Failed to insert media")?;

    let outcome = if affected == 0 {
        Materialized::LostRace
    } else {
        Materialized::Inserted
    };

    let model = find_by_natural_key(conn, tmdb_id, kind)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Media {kind}/{tmdb_id} missing after insert"))?;

    Ok((model, outcome))
}
