mod common;

use std::time::Duration;

use cinelog::domain::MediaKind;
use cinelog::entities::{media, ratings};
use cinelog::services::{RatingError, RatingRequest};
use common::{FakeCatalog, create_user, test_state};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

fn film(tmdb_id: i32, score: f64) -> RatingRequest {
    RatingRequest {
        tmdb_id,
        kind: MediaKind::Film,
        score,
        review: None,
        is_spoiler: false,
    }
}

async fn media_rows(state: &cinelog::state::SharedState, tmdb_id: i32) -> u64 {
    media::Entity::find()
        .filter(media::Column::TmdbId.eq(tmdb_id))
        .count(&state.store.conn)
        .await
        .unwrap()
}

async fn rating_rows(state: &cinelog::state::SharedState, user_id: Uuid) -> u64 {
    ratings::Entity::find()
        .filter(ratings::Column::UserId.eq(user_id))
        .count(&state.store.conn)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_score_bounds_checked_before_catalog() {
    let catalog = FakeCatalog::new();
    let state = test_state(catalog.clone()).await;
    let user = create_user(&state, "alice").await;

    for bad in [7.3, 10.5, 0.0, -1.0] {
        let err = state
            .rating_service
            .upsert(user, film(550, bad))
            .await
            .unwrap_err();
        assert!(matches!(err, RatingError::Validation(_)), "{bad}: {err:?}");
    }
    assert_eq!(catalog.calls(), 0);
    assert_eq!(media_rows(&state, 550).await, 0);

    let view = state
        .rating_service
        .upsert(user, film(550, 7.5))
        .await
        .unwrap();
    assert!((view.rating - 7.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_review_rules() {
    let state = test_state(FakeCatalog::new()).await;
    let user = create_user(&state, "alice").await;

    let mut request = film(550, 8.0);
    request.review = Some("x".repeat(2001));
    let err = state
        .rating_service
        .upsert(user, request)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Review cannot exceed 2000 characters");

    let mut request = film(550, 8.0);
    request.review = Some("   ".to_string());
    let view = state.rating_service.upsert(user, request).await.unwrap();
    assert_eq!(view.review, None);
    assert!(!view.has_review);
}

#[tokio::test]
async fn test_upsert_is_idempotent_per_user_and_media() {
    let state = test_state(FakeCatalog::new()).await;
    let user = create_user(&state, "alice").await;

    let first = state
        .rating_service
        .upsert(user, film(550, 8.0))
        .await
        .unwrap();

    let mut second_request = film(550, 8.0);
    second_request.review = Some("Second thoughts".to_string());
    second_request.is_spoiler = true;
    let second = state
        .rating_service
        .upsert(user, second_request)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.created_at, second.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(second.review.as_deref(), Some("Second thoughts"));
    assert!(second.is_spoiler);
    assert_eq!(rating_rows(&state, user).await, 1);
}

#[tokio::test]
async fn test_resolve_caches_media() {
    let catalog = FakeCatalog::new();
    let state = test_state(catalog.clone()).await;

    let first = state
        .media_resolver
        .resolve(550, MediaKind::Film)
        .await
        .unwrap();
    let second = state
        .media_resolver
        .resolve(550, MediaKind::Film)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.updated_at, second.updated_at);
    assert_eq!(catalog.calls(), 1);
    assert_eq!(first.title, "Title 550");
    assert_eq!(first.genres.as_deref(), Some(r#"[{"id":18,"name":"Drama"}]"#));

    // Same id, other namespace.
    let show = state
        .media_resolver
        .resolve(550, MediaKind::Series)
        .await
        .unwrap();
    assert_ne!(show.id, first.id);
    assert_eq!(show.number_of_seasons, Some(3));
    assert_eq!(media_rows(&state, 550).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_resolve_creates_one_row() {
    let catalog = FakeCatalog::slow(Duration::from_millis(50));
    let state = test_state(catalog.clone()).await;

    let results = futures::future::join_all([
        state.media_resolver.resolve(999, MediaKind::Film),
        state.media_resolver.resolve(999, MediaKind::Film),
    ])
    .await;

    let ids: Vec<Uuid> = results.into_iter().map(|r| r.unwrap().id).collect();
    assert_eq!(ids[0], ids[1]);
    assert_eq!(catalog.calls(), 2);
    assert_eq!(media_rows(&state, 999).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_upserts_keep_one_rating() {
    let state = test_state(FakeCatalog::slow(Duration::from_millis(20))).await;
    let user = create_user(&state, "alice").await;

    let results = futures::future::join_all([
        state.rating_service.upsert(user, film(603, 8.0)),
        state.rating_service.upsert(user, film(603, 9.0)),
    ])
    .await;

    let views: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(views[0].id, views[1].id);
    assert_eq!(rating_rows(&state, user).await, 1);
    assert_eq!(media_rows(&state, 603).await, 1);
}

#[tokio::test]
async fn test_stats_without_ratings() {
    let state = test_state(FakeCatalog::new()).await;
    state
        .media_resolver
        .resolve(42, MediaKind::Film)
        .await
        .unwrap();

    let stats = state
        .rating_service
        .stats_for(42, MediaKind::Film)
        .await
        .unwrap();

    assert_eq!(stats.total_ratings, 0);
    assert!(stats.average_rating.abs() < f64::EPSILON);
    assert!(!stats.average_rating.is_nan());
    assert_eq!(
        [
            stats.five_star_ratings,
            stats.four_star_ratings,
            stats.three_star_ratings,
            stats.two_star_ratings,
            stats.one_star_ratings,
        ],
        [0; 5]
    );
    assert!(stats.recent_ratings.is_empty());
}

#[tokio::test]
async fn test_stats_distribution_and_rounding() {
    let state = test_state(FakeCatalog::new()).await;

    for (i, score) in [9.5, 9.0, 6.0, 3.0, 3.0, 1.0].into_iter().enumerate() {
        let user = create_user(&state, &format!("user{i}")).await;
        state
            .rating_service
            .upsert(user, film(680, score))
            .await
            .unwrap();
    }

    let stats = state
        .rating_service
        .stats_for(680, MediaKind::Film)
        .await
        .unwrap();

    assert_eq!(stats.total_ratings, 6);
    assert!((stats.average_rating - 5.3).abs() < 1e-9);
    assert_eq!(stats.five_star_ratings, 2);
    assert_eq!(stats.four_star_ratings, 0);
    assert_eq!(stats.three_star_ratings, 1);
    assert_eq!(stats.two_star_ratings, 2);
    assert_eq!(stats.one_star_ratings, 1);
    assert_eq!(stats.recent_ratings.len(), 5);
    assert!(
        stats
            .recent_ratings
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at)
    );
}

#[tokio::test]
async fn test_two_users_rate_same_film() {
    let state = test_state(FakeCatalog::new()).await;
    let alice = create_user(&state, "alice").await;
    let bob = create_user(&state, "bob").await;

    let mut request = film(550, 8.5);
    request.review = Some("Great film".to_string());
    state.rating_service.upsert(alice, request).await.unwrap();

    let mine = state
        .rating_service
        .get_for_user_and_media(alice, 550, MediaKind::Film)
        .await
        .unwrap()
        .unwrap();
    assert!((mine.rating - 8.5).abs() < f64::EPSILON);
    assert_eq!(mine.review.as_deref(), Some("Great film"));
    assert_eq!(mine.username, "alice");
    assert_eq!(mine.media_title, "Title 550");
    assert_eq!(mine.media_type, Some(MediaKind::Film));
    assert_eq!(mine.tmdb_id, Some(550));
    assert_eq!(mine.star_rating, "★★★★☆");

    state
        .rating_service
        .upsert(bob, film(550, 3.0))
        .await
        .unwrap();

    let stats = state
        .rating_service
        .stats_for(550, MediaKind::Film)
        .await
        .unwrap();
    assert_eq!(stats.total_ratings, 2);
    assert!((stats.average_rating - 5.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_delete_rules() {
    let state = test_state(FakeCatalog::new()).await;
    let alice = create_user(&state, "alice").await;
    let bob = create_user(&state, "bob").await;

    let view = state
        .rating_service
        .upsert(alice, film(550, 8.0))
        .await
        .unwrap();

    let err = state
        .rating_service
        .delete(view.id, bob)
        .await
        .unwrap_err();
    assert!(matches!(err, RatingError::Forbidden(_)));

    assert!(
        !state
            .rating_service
            .delete(Uuid::new_v4(), alice)
            .await
            .unwrap()
    );

    assert!(state.rating_service.delete(view.id, alice).await.unwrap());

    let after = state
        .rating_service
        .get_for_user_and_media(alice, 550, MediaKind::Film)
        .await
        .unwrap();
    assert!(after.is_none());

    // Media stays cached after its last rating goes away.
    assert_eq!(media_rows(&state, 550).await, 1);
}

#[tokio::test]
async fn test_uncached_media() {
    let catalog = FakeCatalog::new();
    let state = test_state(catalog.clone()).await;
    let alice = create_user(&state, "alice").await;

    let rating = state
        .rating_service
        .get_for_user_and_media(alice, 12, MediaKind::Film)
        .await
        .unwrap();
    assert!(rating.is_none());

    let err = state
        .rating_service
        .stats_for(12, MediaKind::Film)
        .await
        .unwrap_err();
    assert!(matches!(err, RatingError::NotFound(_)));

    assert_eq!(catalog.calls(), 0);
    assert_eq!(media_rows(&state, 12).await, 0);
}

#[tokio::test]
async fn test_catalog_failures_write_nothing() {
    let catalog = FakeCatalog::new();
    let state = test_state(catalog.clone()).await;
    let alice = create_user(&state, "alice").await;

    catalog.mark_missing(404);
    let err = state
        .rating_service
        .upsert(alice, film(404, 8.0))
        .await
        .unwrap_err();
    assert!(matches!(err, RatingError::ExternalDependency { .. }));

    catalog.set_failing(true);
    let err = state
        .rating_service
        .upsert(alice, film(500, 8.0))
        .await
        .unwrap_err();
    assert!(matches!(err, RatingError::ExternalDependency { .. }));

    assert_eq!(media_rows(&state, 404).await, 0);
    assert_eq!(media_rows(&state, 500).await, 0);
    assert_eq!(rating_rows(&state, alice).await, 0);
}

#[tokio::test]
async fn test_unsupported_kind() {
    let state = test_state(FakeCatalog::films_only()).await;
    let alice = create_user(&state, "alice").await;

    let request = RatingRequest {
        kind: MediaKind::Series,
        ..film(1399, 9.0)
    };
    let err = state
        .rating_service
        .upsert(alice, request)
        .await
        .unwrap_err();

    assert!(matches!(err, RatingError::Unsupported(_)));
    assert_eq!(media_rows(&state, 1399).await, 0);
}

#[tokio::test]
async fn test_rating_for_unknown_user() {
    let state = test_state(FakeCatalog::new()).await;

    let err = state
        .rating_service
        .upsert(Uuid::new_v4(), film(550, 8.0))
        .await
        .unwrap_err();

    assert!(matches!(err, RatingError::Unauthenticated));
    // The media insert shared the rolled-back transaction.
    assert_eq!(media_rows(&state, 550).await, 0);
}

#[tokio::test]
async fn test_refresh_overwrites_cached_row() {
    let catalog = FakeCatalog::new();
    let state = test_state(catalog.clone()).await;

    let original = state
        .media_resolver
        .resolve(77, MediaKind::Film)
        .await
        .unwrap();

    catalog.set_title(77, "  Director's Cut ");

    let cached = state
        .media_resolver
        .resolve(77, MediaKind::Film)
        .await
        .unwrap();
    assert_eq!(cached.title, "Title 77");

    let refreshed = state
        .media_resolver
        .refresh(77, MediaKind::Film)
        .await
        .unwrap();
    assert_eq!(refreshed.id, original.id);
    assert_eq!(refreshed.title, "Director's Cut");
    assert_eq!(refreshed.created_at, original.created_at);
    assert!(refreshed.updated_at >= original.updated_at);

    catalog.set_failing(true);
    assert!(
        state
            .media_resolver
            .refresh(77, MediaKind::Film)
            .await
            .is_err()
    );

    let stored = state
        .media_resolver
        .find(77, MediaKind::Film)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Director's Cut");
}

#[tokio::test]
async fn test_refresh_of_uncached_media_resolves() {
    let catalog = FakeCatalog::new();
    let state = test_state(catalog.clone()).await;

    let media = state
        .media_resolver
        .refresh(1396, MediaKind::Series)
        .await
        .unwrap();

    assert_eq!(media.tmdb_id, 1396);
    assert_eq!(media.media_type, MediaKind::Series);
    assert_eq!(catalog.calls(), 1);
    assert_eq!(media_rows(&state, 1396).await, 1);
}

#[tokio::test]
async fn test_list_for_user_pages_newest_first() {
    let state = test_state(FakeCatalog::new()).await;
    let alice = create_user(&state, "alice").await;

    for tmdb_id in 1..=5 {
        state
            .rating_service
            .upsert(alice, film(tmdb_id, 6.0))
            .await
            .unwrap();
    }

    let first_page = state
        .rating_service
        .list_for_user(alice, 1, 2)
        .await
        .unwrap();
    let last_page = state
        .rating_service
        .list_for_user(alice, 3, 2)
        .await
        .unwrap();

    assert_eq!(first_page.len(), 2);
    assert_eq!(last_page.len(), 1);
    assert_eq!(first_page[0].tmdb_id, Some(5));
    assert_eq!(last_page[0].tmdb_id, Some(1));
    assert!(first_page.iter().all(|r| r.username == "alice"));
}

#[tokio::test]
async fn test_list_for_user_rejects_overflowing_page() {
    let state = test_state(FakeCatalog::new()).await;
    let alice = create_user(&state, "alice").await;

    let err = state
        .rating_service
        .list_for_user(alice, u64::MAX, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, RatingError::Validation(_)));

    let err = state
        .rating_service
        .list_for_user(alice, i64::MAX as u64, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, RatingError::Validation(_)));
}

#[tokio::test]
async fn test_database_file_removed_on_drop() {
    let state = test_state(FakeCatalog::new()).await;
    let files = state.db.files();
    assert!(files[0].exists());

    drop(state);
    assert!(!files[0].exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_upserts_leave_no_partial_rows() {
    let state = test_state(FakeCatalog::new()).await;
    let alice = create_user(&state, "alice").await;

    let mut completed = Vec::new();
    let mut cancelled = 0;
    for tmdb_id in 1..=120 {
        let deadline = Duration::from_micros(u64::try_from(tmdb_id % 40).unwrap() * 30);
        let upsert = state.rating_service.upsert(alice, film(tmdb_id, 7.0));
        match tokio::time::timeout(deadline, upsert).await {
            Ok(result) => completed.push(result.unwrap().tmdb_id),
            Err(_) => cancelled += 1,
        }
    }
    assert!(cancelled > 0);

    // Media only ever comes into being together with a rating here.
    let media_total = media::Entity::find()
        .count(&state.store.conn)
        .await
        .unwrap();
    let ratings_total = rating_rows(&state, alice).await;
    assert_eq!(media_total, ratings_total);
    assert!(ratings_total >= completed.len() as u64);

    for tmdb_id in completed.into_iter().flatten() {
        assert_eq!(media_rows(&state, tmdb_id).await, 1);
    }
}
