//! `SeaORM` implementation of the `RatingService` trait.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::{RatingInput, Store, page_offset};
use crate::domain::{MediaKind, Score, normalize_review, summarize};
use crate::entities::{media, ratings, users};
use crate::services::media_service::MediaResolver;
use crate::services::media_service_impl::record_resolution;
use crate::services::rating_service::{
    MediaRatingStats, RatingError, RatingRequest, RatingService, RatingView,
};

const RECENT_RATINGS: usize = 5;
const POSTER_SIZE: &str = "w500";

pub struct SeaOrmRatingService {
    store: Store,
    resolver: Arc<dyn MediaResolver>,
    image_base_url: String,
}

impl SeaOrmRatingService {
    #[must_use]
    pub fn new(store: Store, resolver: Arc<dyn MediaResolver>, image_base_url: String) -> Self {
        Self {
            store,
            resolver,
            image_base_url,
        }
    }

    /// Joins authors and media onto ratings with one batched query each.
    async fn enrich(&self, ratings: Vec<ratings::Model>) -> Result<Vec<RatingView>, RatingError> {
        if ratings.is_empty() {
            return Ok(Vec::new());
        }

        let mut user_ids: Vec<Uuid> = ratings.iter().map(|r| r.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let mut media_ids: Vec<Uuid> = ratings.iter().map(|r| r.media_id).collect();
        media_ids.sort_unstable();
        media_ids.dedup();

        let users: HashMap<Uuid, users::Model> = self
            .store
            .get_users(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let media: HashMap<Uuid, media::Model> = self
            .store
            .get_media_many(&media_ids)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        Ok(ratings
            .into_iter()
            .map(|r| {
                let user = users.get(&r.user_id);
                let media = media.get(&r.media_id);
                to_view(r, user, media, &self.image_base_url)
            })
            .collect())
    }
}

fn poster_url(image_base_url: &str, poster_path: Option<&str>) -> Option<String> {
    let path = poster_path.map(str::trim).filter(|p| !p.is_empty())?;
    let base = image_base_url.trim_end_matches('/');
    let separator = if path.starts_with('/') { "" } else { "/" };
    Some(format!("{base}/{POSTER_SIZE}{separator}{path}"))
}

fn to_view(
    rating: ratings::Model,
    user: Option<&users::Model>,
    media: Option<&media::Model>,
    image_base_url: &str,
) -> RatingView {
    let has_review = rating.review.as_deref().is_some_and(|r| !r.trim().is_empty());

    RatingView {
        id: rating.id,
        user_id: rating.user_id,
        media_id: rating.media_id,
        rating: rating.rating,
        star_rating: Score::from_stored(rating.rating).stars(),
        has_review,
        review: rating.review,
        is_spoiler: rating.is_spoiler,
        created_at: rating.created_at,
        updated_at: rating.updated_at,
        username: user.map_or_else(|| "Unknown User".to_string(), |u| u.username.clone()),
        user_avatar_url: user.and_then(|u| u.avatar_url.clone()),
        media_title: media.map_or_else(|| "Unknown Media".to_string(), |m| m.title.clone()),
        media_poster_url: media.and_then(|m| poster_url(image_base_url, m.poster_path.as_deref())),
        media_type: media.map(|m| m.media_type),
        tmdb_id: media.map(|m| m.tmdb_id),
    }
}

#[async_trait]
impl RatingService for SeaOrmRatingService {
    #[instrument(skip(self, request), fields(tmdb_id = request.tmdb_id, kind = %request.kind))]
    async fn upsert(
        &self,
        user_id: Uuid,
        request: RatingRequest,
    ) -> Result<RatingView, RatingError> {
        let score = Score::new(request.score)?;
        let review = normalize_review(request.review.as_deref())?;

        let slot = self.resolver.locate(request.tmdb_id, request.kind).await?;
        let input = RatingInput {
            score: score.value(),
            review,
            is_spoiler: request.is_spoiler,
        };
        let upserted = self.store.upsert_rating(user_id, slot, input).await?;

        record_resolution(request.kind, upserted.media_outcome);
        metrics::counter!(
            "ratings_upserted_total",
            "outcome" => if upserted.created { "created" } else { "updated" }
        )
        .increment(1);

        info!(
            %user_id,
            rating_id = %upserted.rating.id,
            media_id = %upserted.media.id,
            created = upserted.created,
            "Rating saved"
        );

        let user = self.store.get_user(user_id).await?;
        Ok(to_view(
            upserted.rating,
            user.as_ref(),
            Some(&upserted.media),
            &self.image_base_url,
        ))
    }

    async fn delete(&self, rating_id: Uuid, user_id: Uuid) -> Result<bool, RatingError> {
        let Some(rating) = self.store.get_rating(rating_id).await? else {
            return Ok(false);
        };

        if rating.user_id != user_id {
            warn!(%rating_id, %user_id, owner = %rating.user_id, "Rejected delete of foreign rating");
            return Err(RatingError::Forbidden(
                "You can only delete your own ratings".to_string(),
            ));
        }

        let deleted = self.store.delete_rating(rating_id).await?;
        if deleted {
            info!(%rating_id, %user_id, "Rating deleted");
        }
        Ok(deleted)
    }

    async fn get_for_user_and_media(
        &self,
        user_id: Uuid,
        tmdb_id: i32,
        kind: MediaKind,
    ) -> Result<Option<RatingView>, RatingError> {
        let Some(media) = self.resolver.find(tmdb_id, kind).await? else {
            return Ok(None);
        };

        let Some(rating) = self.store.find_rating(user_id, media.id).await? else {
            return Ok(None);
        };

        let user = self.store.get_user(user_id).await?;
        Ok(Some(to_view(
            rating,
            user.as_ref(),
            Some(&media),
            &self.image_base_url,
        )))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<RatingView>, RatingError> {
        let page = page.max(1);
        if page_offset(page, page_size).is_none() {
            return Err(RatingError::Validation(format!("Page {page} is out of range")));
        }

        let ratings = self
            .store
            .list_ratings_for_user(user_id, page, page_size)
            .await?;
        self.enrich(ratings).await
    }

    #[instrument(skip(self))]
    async fn stats_for(
        &self,
        tmdb_id: i32,
        kind: MediaKind,
    ) -> Result<MediaRatingStats, RatingError> {
        let media = self.resolver.find(tmdb_id, kind).await?.ok_or_else(|| {
            RatingError::NotFound(format!("Media not found: TMDb ID {tmdb_id} ({kind})"))
        })?;

        let ratings = self.store.list_ratings_for_media(media.id).await?;
        let summary = summarize(ratings.iter().map(|r| Score::from_stored(r.rating)));

        let recent: Vec<ratings::Model> = ratings.into_iter().take(RECENT_RATINGS).collect();
        let recent_ratings = self.enrich(recent).await?;

        Ok(MediaRatingStats {
            media_id: media.id,
            tmdb_id: media.tmdb_id,
            media_title: media.title,
            media_type: media.media_type,
            average_rating: summary.average,
            total_ratings: summary.count,
            five_star_ratings: summary.distribution.five,
            four_star_ratings: summary.distribution.four,
            three_star_ratings: summary.distribution.three,
            two_star_ratings: summary.distribution.two,
            one_star_ratings: summary.distribution.one,
            recent_ratings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const IMAGES: &str = "https://image.tmdb.org/t/p/";

    fn rating(score: f64, review: Option<&str>) -> ratings::Model {
        let now = Utc::now();
        ratings::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            media_id: Uuid::new_v4(),
            rating: score,
            review: review.map(str::to_string),
            is_spoiler: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_view_fallbacks_without_joins() {
        let view = to_view(rating(7.0, Some("   ")), None, None, IMAGES);
        assert_eq!(view.username, "Unknown User");
        assert_eq!(view.media_title, "Unknown Media");
        assert_eq!(view.media_type, None);
        assert!(!view.has_review);
        assert_eq!(view.star_rating, "★★★☆☆");
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let view = to_view(rating(8.5, Some("Great film")), None, None, IMAGES);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["hasReview"], true);
        assert_eq!(json["isSpoiler"], false);
        assert!(json.get("starRating").is_some());
        assert!(json.get("mediaPosterUrl").is_some());
    }

    #[test]
    fn test_poster_url() {
        assert_eq!(
            poster_url(IMAGES, Some("/abc.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(
            poster_url("https://cdn.example/img", Some("abc.jpg")).as_deref(),
            Some("https://cdn.example/img/w500/abc.jpg")
        );
        assert_eq!(poster_url(IMAGES, Some("  ")), None);
        assert_eq!(poster_url(IMAGES, None), None);
    }
}
