use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::{Catalog, TmdbClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, MediaResolver, RatingService, SeaOrmAuthService, SeaOrmMediaResolver,
    SeaOrmRatingService, TokenSigner,
};

/// One pooled client for every TMDb call.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("CineLog/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub tmdb: Arc<TmdbClient>,

    pub media_resolver: Arc<dyn MediaResolver>,

    pub rating_service: Arc<dyn RatingService>,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(config.tmdb.request_timeout_seconds)?;
        let tmdb = Arc::new(TmdbClient::with_shared_client(http_client, &config.tmdb));

        Ok(Self::assemble(config, store, tmdb.clone(), tmdb))
    }

    /// Wires services over an existing store. `catalog` backs media
    /// resolution and may differ from the TMDb client used for browsing.
    #[must_use]
    pub fn assemble(
        config: Config,
        store: Store,
        tmdb: Arc<TmdbClient>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        let media_resolver: Arc<dyn MediaResolver> =
            Arc::new(SeaOrmMediaResolver::new(store.clone(), catalog));

        let rating_service: Arc<dyn RatingService> = Arc::new(SeaOrmRatingService::new(
            store.clone(),
            media_resolver.clone(),
            config.tmdb.image_base_url.clone(),
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            TokenSigner::new(&config.auth),
            config.security.clone(),
        ));

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            tmdb,
            media_resolver,
            rating_service,
            auth_service,
        }
    }
}
