pub mod cache;
pub mod config;
pub mod controllers;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;
use tracing::{info, warn};

use services::{BookingService, HallService, ShowService, TopologyCache};
use store::{PgStore, Store};

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub bookings: BookingService,
    pub halls: HallService,
    pub shows: ShowService,
}

impl AppState {
    /// Connect to Postgres (and Redis, when configured) and run migrations.
    pub async fn connect(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let cache = match &config.redis.url {
            Some(url) => match cache::CacheService::connect(url, config.redis.hall_ttl_seconds).await {
                Ok(cache) => {
                    info!("Redis connected");
                    Some(cache)
                }
                Err(e) => {
                    warn!("Redis unavailable, hall cache disabled: {:?}", e);
                    None
                }
            },
            None => None,
        };

        let store = PgStore::connect(&config.database, cache).await?;
        info!("Database connected");
        store.run_migrations().await?;

        let store: Arc<dyn Store> = Arc::new(store);
        Ok(Self::with_store(config, store))
    }

    /// Build the state over any store, e.g. [`store::MemoryStore`] in tests.
    pub fn with_store(config: config::Config, store: Arc<dyn Store>) -> Arc<Self> {
        let topology = Arc::new(TopologyCache::new());
        Arc::new(Self {
            bookings: BookingService::new(store.clone(), topology.clone(), &config.booking),
            halls: HallService::new(store.clone(), topology),
            shows: ShowService::new(store),
            config,
        })
    }
}
