// Error types module

use thiserror::Error;

use crate::store::StoreError;

/// Centralized error type for the gateway
///
/// Every variant maps to a stable wire code (see [`GatewayError::code`]) that
/// is sent back to the client in a command's error completion.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The pool list in the shared store is empty
    #[error("There are no request handlers registered")]
    NoBackendsAvailable,

    /// The shared store could not be read
    #[error("Shared store unavailable: {0}")]
    StoreUnavailable(String),

    /// Missing, empty or unknown session on a command that needs one
    #[error("Session parameter is invalid or missing: {0}")]
    InvalidSession(String),

    /// A request handler returned a non-success status or could not be reached
    #[error("Backend {backend} failed: {detail}")]
    BackendError {
        backend: String,
        status: Option<u16>,
        detail: String,
    },

    /// Persisting a session's affinity failed
    #[error("Failed to persist session affinity: {0}")]
    AffinityWriteFailed(String),

    /// Registration in the routing table failed (fatal at startup)
    #[error("Failed to register in routing table: {0}")]
    RegistrationFailed(String),

    /// Malformed envelope or unknown command type
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// The streaming bridge could not be set up
    #[error("Streaming bridge error: {0}")]
    Bridge(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal gateway errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable error code reported to clients
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::NoBackendsAvailable => "NoBackendsAvailable",
            GatewayError::StoreUnavailable(_) => "StoreUnavailable",
            GatewayError::InvalidSession(_) => "InvalidSession",
            GatewayError::BackendError { .. } => "BackendError",
            GatewayError::AffinityWriteFailed(_) => "AffinityWriteFailed",
            GatewayError::RegistrationFailed(_) => "RegistrationFailed",
            GatewayError::InvalidCommand(_) => "InvalidCommand",
            GatewayError::Bridge(_) => "BridgeError",
            GatewayError::Config(_) => "ConfigError",
            GatewayError::Internal(_) => "InternalError",
        }
    }

    /// Build a backend error from a transport failure (no HTTP status)
    pub fn backend_unreachable(backend: &str, detail: impl Into<String>) -> Self {
        GatewayError::BackendError {
            backend: backend.to_string(),
            status: None,
            detail: detail.into(),
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        GatewayError::StoreUnavailable(err.to_string())
    }
}
