// Shared store configuration module

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::constants::{
    DEFAULT_AFFINITY_KEY, DEFAULT_POOL_KEY, DEFAULT_REDIS_URL, DEFAULT_ROUTING_KEY_PREFIX,
    DEFAULT_ROUTING_SENTINEL, DEFAULT_STORE_CONNECTION_TIMEOUT_MS,
    DEFAULT_STORE_OPERATION_TIMEOUT_MS,
};

/// Shared store (Redis) configuration
///
/// Key names are configurable so several deployments can share one Redis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// List of request handler backends (default: "rh")
    #[serde(default = "default_pool_key")]
    pub pool_key: String,

    /// Hash of session -> backend (default: "affinity")
    #[serde(default = "default_affinity_key")]
    pub affinity_key: String,

    /// Routing table list prefix, completed by the public host (default: "frontend:")
    #[serde(default = "default_routing_key_prefix")]
    pub routing_key_prefix: String,

    /// Index entry that marks a routing list as initialized (default: "point-serve")
    #[serde(default = "default_sentinel")]
    pub sentinel: String,

    /// Connection timeout in milliseconds (default: 5000 = 5 seconds)
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Operation timeout in milliseconds (default: 2000 = 2 seconds)
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            pool_key: default_pool_key(),
            affinity_key: default_affinity_key(),
            routing_key_prefix: default_routing_key_prefix(),
            sentinel: default_sentinel(),
            connection_timeout_ms: default_connection_timeout_ms(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Routing table key for a public host name
    pub fn routing_key(&self, public_host: &str) -> String {
        format!("{}{}", self.routing_key_prefix, public_host)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("store.redis_url", &self.redis_url),
            ("store.pool_key", &self.pool_key),
            ("store.affinity_key", &self.affinity_key),
            ("store.sentinel", &self.sentinel),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Invalid(format!("{} cannot be empty", name)));
            }
        }
        if self.operation_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.operation_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_redis_url() -> String {
    DEFAULT_REDIS_URL.to_string()
}

fn default_pool_key() -> String {
    DEFAULT_POOL_KEY.to_string()
}

fn default_affinity_key() -> String {
    DEFAULT_AFFINITY_KEY.to_string()
}

fn default_routing_key_prefix() -> String {
    DEFAULT_ROUTING_KEY_PREFIX.to_string()
}

fn default_sentinel() -> String {
    DEFAULT_ROUTING_SENTINEL.to_string()
}

fn default_connection_timeout_ms() -> u64 {
    DEFAULT_STORE_CONNECTION_TIMEOUT_MS
}

fn default_operation_timeout_ms() -> u64 {
    DEFAULT_STORE_OPERATION_TIMEOUT_MS
}
