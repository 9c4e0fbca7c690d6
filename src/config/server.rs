//! Server configuration types.
//!
//! This module defines the listener binding, the public host name that keys
//! this gateway's routing table entry, and the address advertised there.
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ConfigError;
use crate::constants::{
    DEFAULT_KEEPALIVE_INTERVAL_SECS, DEFAULT_LISTEN_ADDRESS, DEFAULT_PORT, DEFAULT_PUBLIC_HOST,
};

fn default_address() -> String {
    DEFAULT_LISTEN_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_public_host() -> String {
    DEFAULT_PUBLIC_HOST.to_string()
}

fn default_keepalive_interval_secs() -> u64 {
    DEFAULT_KEEPALIVE_INTERVAL_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public host name of the deployment; keys the routing table list
    #[serde(default = "default_public_host")]
    pub public_host: String,
    /// Address registered in the routing table (default: http://127.0.0.1:<port>)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise_url: Option<String>,
    /// Interval between WebSocket keepalive pings, 0 disables them
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            public_host: default_public_host(),
            advertise_url: None,
            keepalive_interval_secs: default_keepalive_interval_secs(),
        }
    }
}

impl ServerConfig {
    /// Socket address string the WebSocket listener binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Address this instance registers under in the routing table
    pub fn advertise_url(&self) -> String {
        self.advertise_url
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.port))
    }

    /// Keepalive ping interval, `None` when disabled
    pub fn keepalive_interval(&self) -> Option<Duration> {
        match self.keepalive_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("server.port cannot be 0".to_string()));
        }
        if self.public_host.is_empty() {
            return Err(ConfigError::Invalid(
                "server.public_host cannot be empty".to_string(),
            ));
        }
        if matches!(&self.advertise_url, Some(url) if url.is_empty()) {
            return Err(ConfigError::Invalid(
                "server.advertise_url cannot be empty when set".to_string(),
            ));
        }
        Ok(())
    }
}
