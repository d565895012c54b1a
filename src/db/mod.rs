use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::domain::MediaKind;
use crate::entities::{media, ratings, users};

pub mod migrator;
pub mod repositories;

pub use repositories::media::{Materialized, MediaRecord, MediaSlot};
pub use repositories::rating::{RatingInput, UpsertedRating, page_offset};
pub use repositories::user::NewUser;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") {
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn media_repo(&self) -> repositories::media::MediaRepository {
        repositories::media::MediaRepository::new(self.conn.clone())
    }

    fn rating_repo(&self) -> repositories::rating::RatingRepository {
        repositories::rating::RatingRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(
        &self,
        user: NewUser,
        security: &SecurityConfig,
    ) -> Result<Option<users::Model>> {
        self.user_repo().create(user, security).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<users::Model>> {
        self.user_repo().get_many(ids).await
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        self.user_repo().exists_by_email(email).await
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        self.user_repo().exists_by_username(username).await
    }

    pub async fn verify_user_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<users::Model>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn verify_user_password(&self, id: Uuid, password: &str) -> Result<bool> {
        self.user_repo().verify_password(id, password).await
    }

    pub async fn update_user_password(
        &self,
        id: Uuid,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, security)
            .await
    }

    pub async fn list_users(&self, limit: u64) -> Result<Vec<users::Model>> {
        self.user_repo().list(limit).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // Media

    pub async fn find_media(&self, tmdb_id: i32, kind: MediaKind) -> Result<Option<media::Model>> {
        self.media_repo().find_by_natural_key(tmdb_id, kind).await
    }

    pub async fn get_media_many(&self, ids: &[Uuid]) -> Result<Vec<media::Model>> {
        self.media_repo().get_many(ids).await
    }

    pub async fn materialize_media(&self, slot: MediaSlot) -> Result<(media::Model, Materialized)> {
        self.media_repo().materialize(slot).await
    }

    pub async fn overwrite_media(
        &self,
        existing: media::Model,
        record: MediaRecord,
    ) -> Result<media::Model> {
        self.media_repo().overwrite(existing, record).await
    }

    // Ratings

    pub async fn upsert_rating(
        &self,
        user_id: Uuid,
        slot: MediaSlot,
        input: RatingInput,
    ) -> Result<UpsertedRating> {
        self.rating_repo().upsert(user_id, slot, input).await
    }

    pub async fn get_rating(&self, id: Uuid) -> Result<Option<ratings::Model>> {
        self.rating_repo().get_by_id(id).await
    }

    pub async fn find_rating(
        &self,
        user_id: Uuid,
        media_id: Uuid,
    ) -> Result<Option<ratings::Model>> {
        self.rating_repo()
            .find_for_user_and_media(user_id, media_id)
            .await
    }

    pub async fn delete_rating(&self, id: Uuid) -> Result<bool> {
        self.rating_repo().delete(id).await
    }

    pub async fn list_ratings_for_media(&self, media_id: Uuid) -> Result<Vec<ratings::Model>> {
        self.rating_repo().list_for_media(media_id).await
    }

    pub async fn list_ratings_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<ratings::Model>> {
        self.rating_repo()
            .list_for_user(user_id, page, page_size)
            .await
    }
}
