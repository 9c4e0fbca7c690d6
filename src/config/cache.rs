// Cache configuration for the pool and affinity caches

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ConfigError;
use crate::constants::{
    DEFAULT_AFFINITY_CAPACITY, DEFAULT_AFFINITY_TTL_MS, DEFAULT_POOL_CAPACITY, DEFAULT_POOL_TTL_MS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Pool list TTL in milliseconds (default: 5000)
    #[serde(default = "default_pool_ttl_ms")]
    pub pool_ttl_ms: u64,

    /// Pool list cache capacity (default: 10)
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: u64,

    /// Affinity entry TTL in milliseconds (default: 1000)
    #[serde(default = "default_affinity_ttl_ms")]
    pub affinity_ttl_ms: u64,

    /// Affinity cache capacity in sessions, LRU evicted (default: 1000)
    #[serde(default = "default_affinity_capacity")]
    pub affinity_capacity: u64,

    /// Cache "unknown session" lookups too (default: true)
    #[serde(default = "default_cache_unknown_sessions")]
    pub cache_unknown_sessions: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            pool_ttl_ms: default_pool_ttl_ms(),
            pool_capacity: default_pool_capacity(),
            affinity_ttl_ms: default_affinity_ttl_ms(),
            affinity_capacity: default_affinity_capacity(),
            cache_unknown_sessions: default_cache_unknown_sessions(),
        }
    }
}

impl CacheConfig {
    pub fn pool_ttl(&self) -> Duration {
        Duration::from_millis(self.pool_ttl_ms)
    }

    pub fn affinity_ttl(&self) -> Duration {
        Duration::from_millis(self.affinity_ttl_ms)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_ttl_ms == 0 || self.affinity_ttl_ms == 0 {
            return Err(ConfigError::Invalid(
                "cache TTLs must be greater than 0".to_string(),
            ));
        }
        if self.pool_capacity == 0 || self.affinity_capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache capacities must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_pool_ttl_ms() -> u64 {
    DEFAULT_POOL_TTL_MS
}

fn default_pool_capacity() -> u64 {
    DEFAULT_POOL_CAPACITY
}

fn default_affinity_ttl_ms() -> u64 {
    DEFAULT_AFFINITY_TTL_MS
}

fn default_affinity_capacity() -> u64 {
    DEFAULT_AFFINITY_CAPACITY
}

fn default_cache_unknown_sessions() -> bool {
    true
}
