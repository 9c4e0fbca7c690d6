//! Backend pool cache
//!
//! Resolves the list of request handler backends registered in the shared
//! store. The list is cached in memory for a short TTL and is never
//! invalidated early, so a pick may use a list up to one TTL old.
//! Empty lists and store failures are never cached.

use moka::future::Cache;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod selector;

pub use selector::{BackendSelector, RandomSelector};

use crate::config::CacheConfig;
use crate::error::GatewayError;
use crate::stats::{CacheStats, CacheStatsTracker};
use crate::store::SharedStore;

/// Cached view of the backend pool
pub struct BackendPool {
    store: Arc<dyn SharedStore>,
    pool_key: String,
    cache: Cache<String, Arc<Vec<String>>>,
    selector: Arc<dyn BackendSelector>,
    stats: CacheStatsTracker,
}

impl BackendPool {
    /// Create a pool cache reading the list stored under `pool_key`
    pub fn new(store: Arc<dyn SharedStore>, pool_key: impl Into<String>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.pool_capacity)
            .time_to_live(config.pool_ttl())
            .build();

        Self {
            store,
            pool_key: pool_key.into(),
            cache,
            selector: Arc::new(RandomSelector),
            stats: CacheStatsTracker::new(),
        }
    }

    /// Replace the selection strategy
    pub fn with_selector(mut self, selector: Arc<dyn BackendSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Current backend list, from cache or from the store
    ///
    /// # Errors
    ///
    /// - `NoBackendsAvailable` if the stored list is empty
    /// - `StoreUnavailable` if the store cannot be read
    pub async fn backends(&self) -> Result<Arc<Vec<String>>, GatewayError> {
        if let Some(list) = self.cache.get(&self.pool_key).await {
            self.stats.increment_hits();
            return Ok(list);
        }
        self.stats.increment_misses();

        let list = self
            .store
            .lrange(&self.pool_key, 0, -1)
            .await
            .map_err(|e| {
                warn!(pool_key = %self.pool_key, error = %e, "failed to read backend pool");
                GatewayError::StoreUnavailable(e.to_string())
            })?;

        if list.is_empty() {
            return Err(GatewayError::NoBackendsAvailable);
        }

        let list = Arc::new(list);
        self.cache
            .insert(self.pool_key.clone(), Arc::clone(&list))
            .await;
        debug!(pool_key = %self.pool_key, backends = list.len(), "backend pool refreshed");
        Ok(list)
    }

    /// Pick the backend for a new session
    pub async fn pick_backend(&self) -> Result<String, GatewayError> {
        let list = self.backends().await?;
        let backend = self
            .selector
            .select(&list)
            .ok_or(GatewayError::NoBackendsAvailable)?
            .to_string();

        debug!(backend = %backend, "picked request handler");
        Ok(backend)
    }

    /// Cache statistics snapshot
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.cache.entry_count())
    }
}
