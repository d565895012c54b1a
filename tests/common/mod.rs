#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cinelog::clients::{Catalog, CatalogError, Genre, KindDetails, MediaDetails, TmdbClient};
use cinelog::config::{Config, SecurityConfig};
use cinelog::db::{NewUser, Store};
use cinelog::domain::MediaKind;
use cinelog::state::SharedState;
use uuid::Uuid;

/// In-process catalog that counts lookups and can be told to misbehave.
#[derive(Default)]
pub struct FakeCatalog {
    calls: AtomicUsize,
    films_only: bool,
    failing: AtomicBool,
    delay: Option<Duration>,
    missing: Mutex<HashSet<i32>>,
    titles: Mutex<HashMap<i32, String>>,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn films_only() -> Arc<Self> {
        Arc::new(Self {
            films_only: true,
            ..Self::default()
        })
    }

    /// Every lookup sleeps first, so concurrent callers all miss the cache.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn mark_missing(&self, tmdb_id: i32) {
        self.missing.lock().unwrap().insert(tmdb_id);
    }

    pub fn set_title(&self, tmdb_id: i32, title: &str) {
        self.titles
            .lock()
            .unwrap()
            .insert(tmdb_id, title.to_string());
    }
}

#[async_trait::async_trait]
impl Catalog for FakeCatalog {
    async fn fetch_details(
        &self,
        tmdb_id: i32,
        kind: MediaKind,
    ) -> Result<MediaDetails, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.films_only && kind == MediaKind::Series {
            return Err(CatalogError::Unsupported(kind));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Transport(
                "TMDb API error: 503 Service Unavailable".to_string(),
            ));
        }
        if self.missing.lock().unwrap().contains(&tmdb_id) {
            return Err(CatalogError::NotFound { tmdb_id, kind });
        }

        let title = self
            .titles
            .lock()
            .unwrap()
            .get(&tmdb_id)
            .cloned()
            .unwrap_or_else(|| format!("Title {tmdb_id}"));

        let kind_details = match kind {
            MediaKind::Film => KindDetails::Film {
                runtime: Some(120),
                budget: None,
                revenue: None,
            },
            MediaKind::Series => KindDetails::Series {
                number_of_seasons: Some(3),
                number_of_episodes: Some(30),
                last_air_date: Some("2021-06-01".to_string()),
            },
        };

        Ok(MediaDetails {
            title: Some(title),
            original_title: None,
            overview: Some("An overview.".to_string()),
            date: Some("1999-10-15".to_string()),
            poster_path: Some(format!("/poster-{tmdb_id}.jpg")),
            backdrop_path: None,
            vote_average: Some(7.9),
            vote_count: Some(100),
            popularity: Some(12.5),
            original_language: Some("en".to_string()),
            genres: vec![Genre {
                id: 18,
                name: "Drama".to_string(),
            }],
            production_countries: Vec::new(),
            imdb_id: None,
            adult: false,
            tagline: None,
            homepage: None,
            status: Some("Released".to_string()),
            kind: kind_details,
        })
    }
}

/// A SQLite file under the temp dir, removed with its WAL files on drop.
pub struct TempDb {
    path: PathBuf,
}

impl TempDb {
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("cinelog-test-{}.db", Uuid::new_v4())),
        }
    }

    pub fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path.display())
    }

    pub fn files(&self) -> Vec<PathBuf> {
        ["", "-wal", "-shm", "-journal"]
            .iter()
            .map(|suffix| PathBuf::from(format!("{}{suffix}", self.path.display())))
            .collect()
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for file in self.files() {
            let _ = std::fs::remove_file(file);
        }
    }
}

pub fn test_config(db: &TempDb) -> Config {
    let mut config = Config::default();
    config.general.database_path = db.url();
    config.auth.jwt_secret = "test-secret-0123456789abcdef0123456789".to_string();
    config.tmdb.api_key = "test".to_string();
    config.security = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    };
    config.observability.metrics_enabled = false;
    config
}

/// Services over a fresh database. The file goes away when this is dropped.
pub struct TestState {
    pub state: SharedState,
    pub db: TempDb,
}

impl Deref for TestState {
    type Target = SharedState;

    fn deref(&self) -> &SharedState {
        &self.state
    }
}

pub async fn test_state(catalog: Arc<FakeCatalog>) -> TestState {
    let db = TempDb::new();
    let config = test_config(&db);
    let store = Store::with_pool_options(&config.general.database_path, 5, 1)
        .await
        .expect("Failed to open test database");
    let tmdb = Arc::new(TmdbClient::new(&config.tmdb));
    TestState {
        state: SharedState::assemble(config, store, tmdb, catalog),
        db,
    }
}

pub async fn create_user(state: &SharedState, username: &str) -> Uuid {
    let security = state.config.read().await.security.clone();
    let user = NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "password123".to_string(),
        first_name: None,
        last_name: None,
    };

    state
        .store
        .create_user(user, &security)
        .await
        .expect("Failed to create user")
        .expect("User already exists")
        .id
}

