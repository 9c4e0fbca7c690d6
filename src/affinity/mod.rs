//! Session affinity store
//!
//! Maps a session id to the backend it is pinned to. The shared store hash
//! is the source of truth; a small LRU cache with a short TTL sits in front
//! of it. Writes go to the store first and populate the cache only after
//! they succeed, which gives the writer read-your-write while other gateway
//! instances converge within one TTL.

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::GatewayError;
use crate::stats::{CacheStats, CacheStatsTracker};
use crate::store::SharedStore;

/// Session -> backend mapping with a read-through cache
pub struct AffinityStore {
    store: Arc<dyn SharedStore>,
    affinity_key: String,
    /// `None` values record sessions the store did not know
    cache: Cache<String, Option<String>>,
    cache_unknown_sessions: bool,
    stats: CacheStatsTracker,
}

impl AffinityStore {
    pub fn new(
        store: Arc<dyn SharedStore>,
        affinity_key: impl Into<String>,
        config: &CacheConfig,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.affinity_capacity)
            .time_to_live(config.affinity_ttl())
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            store,
            affinity_key: affinity_key.into(),
            cache,
            cache_unknown_sessions: config.cache_unknown_sessions,
            stats: CacheStatsTracker::new(),
        }
    }

    /// Pin `session` to `backend`
    ///
    /// On failure nothing is persisted and nothing is cached.
    pub async fn set_affinity(&self, session: &str, backend: &str) -> Result<(), GatewayError> {
        self.store
            .hset(&self.affinity_key, session, backend)
            .await
            .map_err(|e| GatewayError::AffinityWriteFailed(e.to_string()))?;

        self.cache
            .insert(session.to_string(), Some(backend.to_string()))
            .await;
        debug!(session, backend, "affinity set");
        Ok(())
    }

    /// Backend a session is pinned to, `None` for unknown sessions
    pub async fn get_affinity(&self, session: &str) -> Result<Option<String>, GatewayError> {
        if let Some(cached) = self.cache.get(session).await {
            self.stats.increment_hits();
            return Ok(cached);
        }
        self.stats.increment_misses();

        let value = self
            .store
            .hget(&self.affinity_key, session)
            .await
            .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))?;

        if value.is_some() || self.cache_unknown_sessions {
            self.cache.insert(session.to_string(), value.clone()).await;
        }
        debug!(session, backend = ?value, "affinity resolved from store");
        Ok(value)
    }

    /// Remove a session's affinity from the store, then from the cache
    pub async fn delete_affinity(&self, session: &str) -> Result<(), GatewayError> {
        let existed = self
            .store
            .hdel(&self.affinity_key, session)
            .await
            .map_err(|e| {
                warn!(session, error = %e, "failed to delete affinity");
                GatewayError::StoreUnavailable(e.to_string())
            })?;

        self.cache.invalidate(session).await;
        debug!(session, existed, "affinity deleted");
        Ok(())
    }

    /// Cache statistics snapshot
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.cache.entry_count())
    }
}
