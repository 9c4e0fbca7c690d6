// Streaming bridge configuration

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use super::ConfigError;
use crate::constants::{
    DEFAULT_STREAMING_ACCEPT_TIMEOUT_MS, DEFAULT_STREAMING_BIND_ADDRESS,
    DEFAULT_STREAMING_CHUNK_SIZE, DEFAULT_STREAMING_MAX_PENDING_BYTES,
};
use crate::streaming::BridgeOptions;

fn default_bind_address() -> String {
    DEFAULT_STREAMING_BIND_ADDRESS.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_STREAMING_CHUNK_SIZE
}

fn default_accept_timeout_ms() -> u64 {
    DEFAULT_STREAMING_ACCEPT_TIMEOUT_MS
}

fn default_max_pending_bytes() -> usize {
    DEFAULT_STREAMING_MAX_PENDING_BYTES
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// IP the per-read TCP listener binds to (port is always ephemeral)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Host reported to the backend instead of the bound IP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise_host: Option<String>,

    /// Maximum bytes forwarded per binary frame
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// How long the bridge waits for the backend to connect once the read
    /// metadata has been sent
    #[serde(default = "default_accept_timeout_ms")]
    pub accept_timeout_ms: u64,

    /// Bytes buffered before the bridge is armed; reads from the backend
    /// pause past this point
    #[serde(default = "default_max_pending_bytes")]
    pub max_pending_bytes: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            advertise_host: None,
            chunk_size: default_chunk_size(),
            accept_timeout_ms: default_accept_timeout_ms(),
            max_pending_bytes: default_max_pending_bytes(),
        }
    }
}

impl StreamingConfig {
    /// Parsed bind IP
    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.bind_address.parse().map_err(|e| {
            ConfigError::Invalid(format!(
                "streaming.bind_address '{}' is not an IP address: {}",
                self.bind_address, e
            ))
        })
    }

    /// Per-bridge limits
    pub fn options(&self) -> BridgeOptions {
        BridgeOptions {
            chunk_size: self.chunk_size,
            accept_timeout: Duration::from_millis(self.accept_timeout_ms),
            max_pending_bytes: self.max_pending_bytes,
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.bind_ip()?;
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "streaming.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.accept_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "streaming.accept_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_pending_bytes == 0 {
            return Err(ConfigError::Invalid(
                "streaming.max_pending_bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
