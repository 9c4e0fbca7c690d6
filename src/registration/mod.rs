//! Self-registration in the reverse-proxy routing table
//!
//! The routing layer (hipache-style) reads `frontend:<host>` lists whose first
//! entry is an index marker and whose remaining entries are backend URLs.
//! On startup this gateway appends its own address, creating the index
//! marker first when the list does not exist yet. On shutdown it removes
//! exactly one occurrence of its address.
//!
//! State machine:
//! - **Unregistered** → `register()` → **Registering** → **Registered**
//! - **Registered** → `unregister()` → **Unregistering** → **Unregistered**
//!
//! A failed registration returns to Unregistered and is fatal for startup.
//! A failed deregistration is logged and not retried. `unregister()` on any
//! state other than Registered is a no-op, so concurrent shutdown paths
//! remove the entry at most once.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::error::GatewayError;
use crate::store::SharedStore;

/// Registration lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    Registering,
    Registered,
    Unregistering,
}

/// This gateway's entry in the routing table
pub struct Registration {
    store: Arc<dyn SharedStore>,
    key: String,
    sentinel: String,
    address: String,
    state: Mutex<RegistrationState>,
}

impl Registration {
    pub fn new(
        store: Arc<dyn SharedStore>,
        key: impl Into<String>,
        sentinel: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            sentinel: sentinel.into(),
            address: address.into(),
            state: Mutex::new(RegistrationState::Unregistered),
        }
    }

    /// Build the registration described by the configuration
    pub fn from_config(store: Arc<dyn SharedStore>, config: &Config) -> Self {
        Self::new(
            store,
            config.store.routing_key(&config.server.public_host),
            config.store.sentinel.clone(),
            config.server.advertise_url(),
        )
    }

    pub fn state(&self) -> RegistrationState {
        *self.state.lock()
    }

    /// Routing table key this gateway registers under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Address this gateway registers as
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Append this gateway to the routing table
    ///
    /// # Errors
    ///
    /// Returns `RegistrationFailed` if any store call fails or if the
    /// registration is not in the Unregistered state.
    pub async fn register(&self) -> Result<(), GatewayError> {
        {
            let mut state = self.state.lock();
            if *state != RegistrationState::Unregistered {
                return Err(GatewayError::RegistrationFailed(format!(
                    "cannot register from state {:?}",
                    *state
                )));
            }
            *state = RegistrationState::Registering;
        }

        match self.append_self().await {
            Ok(()) => {
                *self.state.lock() = RegistrationState::Registered;
                info!(key = %self.key, address = %self.address, "registered in routing table");
                Ok(())
            }
            Err(e) => {
                *self.state.lock() = RegistrationState::Unregistered;
                Err(GatewayError::RegistrationFailed(e.to_string()))
            }
        }
    }

    async fn append_self(&self) -> Result<(), crate::store::StoreError> {
        let head = self.store.lrange(&self.key, 0, 0).await?;
        if head.is_empty() {
            info!(key = %self.key, "routing index does not exist, adding");
            self.store.rpush(&self.key, &self.sentinel).await?;
        }
        self.store.rpush(&self.key, &self.address).await?;
        Ok(())
    }

    /// Remove this gateway from the routing table
    ///
    /// Runs at most once per successful registration. Failures are logged
    /// and swallowed so they never hold up process exit.
    pub async fn unregister(&self) {
        {
            let mut state = self.state.lock();
            if *state != RegistrationState::Registered {
                return;
            }
            *state = RegistrationState::Unregistering;
        }

        match self.store.lrem(&self.key, 1, &self.address).await {
            Ok(removed) => {
                info!(key = %self.key, address = %self.address, removed, "unregistered from routing table");
            }
            Err(e) => {
                error!(key = %self.key, address = %self.address, error = %e, "error trying to unregister from routing table");
            }
        }

        *self.state.lock() = RegistrationState::Unregistered;
    }
}
