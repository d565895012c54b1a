use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::OnConflict,
};
use uuid::Uuid;

use super::media::{Materialized, MediaSlot, materialize};
use crate::entities::{media, ratings};

/// Validated values to store for one (user, media) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingInput {
    pub score: f64,
    pub review: Option<String>,
    pub is_spoiler: bool,
}

#[derive(Debug, Clone)]
pub struct UpsertedRating {
    pub rating: ratings::Model,
    pub media: media::Model,
    pub media_outcome: Materialized,
    /// `false` when an existing rating was updated in place.
    pub created: bool,
}

pub struct RatingRepository {
    conn: DatabaseConnection,
}

impl RatingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Materializes the media row and upserts the rating in one transaction.
    ///
    /// Both writes are conflict-aware inserts on their unique indexes, so a
    /// concurrent request for the same key is absorbed instead of failing.
    /// Dropping the future before commit rolls the transaction back.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        slot: MediaSlot,
        input: RatingInput,
    ) -> Result<UpsertedRating> {
        let txn = self.conn.begin().await?;

        let (media, media_outcome) = materialize(&txn, slot).await?;

        let now = Utc::now();
        let candidate_id = Uuid::new_v4();
        let active = ratings::ActiveModel {
            id: Set(candidate_id),
            user_id: Set(user_id),
            media_id: Set(media.id),
            rating: Set(input.score),
            review: Set(input.review),
            is_spoiler: Set(input.is_spoiler),
            created_at: Set(now),
            updated_at: Set(now),
        };

        ratings::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([ratings::Column::UserId, ratings::Column::MediaId])
                    .update_columns([
                        ratings::Column::Rating,
                        ratings::Column::Review,
                        ratings::Column::IsSpoiler,
                        ratings::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("Failed to upsert rating")?;

        let rating = find_for_user_and_media(&txn, user_id, media.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Rating for media {} missing after upsert", media.id))?;

        txn.commit().await?;

        let created = rating.id == candidate_id;
        Ok(UpsertedRating {
            rating,
            media,
            media_outcome,
            created,
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<ratings::Model>> {
        ratings::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query rating by ID")
    }

    pub async fn find_for_user_and_media(
        &self,
        user_id: Uuid,
        media_id: Uuid,
    ) -> Result<Option<ratings::Model>> {
        find_for_user_and_media(&self.conn, user_id, media_id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = ratings::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete rating")?;
        Ok(result.rows_affected > 0)
    }

    /// Every rating for the media, newest first.
    pub async fn list_for_media(&self, media_id: Uuid) -> Result<Vec<ratings::Model>> {
        ratings::Entity::find()
            .filter(ratings::Column::MediaId.eq(media_id))
            .order_by_desc(ratings::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list ratings for media")
    }

    /// One page of a user's ratings, newest first. `page` is 1-based.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<ratings::Model>> {
        let offset = page_offset(page, page_size)
            .ok_or_else(|| anyhow::anyhow!("Page {page} of size {page_size} is out of range"))?;

        ratings::Entity::find()
            .filter(ratings::Column::UserId.eq(user_id))
            .order_by_desc(ratings::Column::CreatedAt)
            .offset(offset)
            .limit(page_size)
            .all(&self.conn)
            .await
            .context("Failed to list ratings for user")
    }

}

/// Row offset of a 1-based page. `None` when it does not fit an SQLite integer.
#[must_use]
pub fn page_offset(page: u64, page_size: u64) -> Option<u64> {
    page.saturating_sub(1)
        .checked_mul(page_size)
        .filter(|offset| i64::try_from(*offset).is_ok())
}

async fn find_for_user_and_media<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    media_id: Uuid,
) -> Result<Option<ratings::Model>> {
    ratings::Entity::find()
        .filter(ratings::Column::UserId.eq(user_id))
        .filter(ratings::Column::MediaId.eq(media_id))
        .one(conn)
        .await
        .context("Failed to query rating by user and media")
}

#[cfg(test)]
mod tests {
    use super::page_offset;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 20), Some(0));
        assert_eq!(page_offset(3, 20), Some(40));
        assert_eq!(page_offset(0, 20), Some(0));
        assert_eq!(page_offset(u64::MAX, 100), None);
        assert_eq!(page_offset(u64::MAX / 2, 2), None);
    }
}
