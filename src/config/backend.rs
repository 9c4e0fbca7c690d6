// Request handler (backend) client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ConfigError;
use crate::constants::DEFAULT_BACKEND_REQUEST_TIMEOUT_MS;

fn default_request_timeout_ms() -> u64 {
    DEFAULT_BACKEND_REQUEST_TIMEOUT_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Timeout for create, pointsCount and destroy calls in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Timeout for the read call in milliseconds. Unset means the read waits
    /// for the backend indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            read_timeout_ms: None,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "backend.request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.read_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "backend.read_timeout_ms must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}
