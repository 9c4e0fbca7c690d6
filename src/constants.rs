// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Config defaults, cache sizing and store key names live here so the
// config module and the components agree on them.

// =============================================================================
// Server defaults
// =============================================================================

/// Default listen address
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";

/// Default listen port (also read from `PORT`)
pub const DEFAULT_PORT: u16 = 8080;

/// Default public host name used for the routing table key (also read from `HOST`)
pub const DEFAULT_PUBLIC_HOST: &str = "localhost";

/// Default WebSocket keepalive ping interval in seconds
pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 30;

// =============================================================================
// Shared store defaults
// =============================================================================

/// Default Redis URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// List holding the addresses of all request handler backends
pub const DEFAULT_POOL_KEY: &str = "rh";

/// Hash mapping session ids to the backend they are pinned to
pub const DEFAULT_AFFINITY_KEY: &str = "affinity";

/// Prefix of the reverse-proxy routing list, followed by the public host
pub const DEFAULT_ROUTING_KEY_PREFIX: &str = "frontend:";

/// First entry of a routing list, marks it as initialized
pub const DEFAULT_ROUTING_SENTINEL: &str = "point-serve";

/// Default store connection timeout in milliseconds
pub const DEFAULT_STORE_CONNECTION_TIMEOUT_MS: u64 = 5000;

/// Default store operation timeout in milliseconds
pub const DEFAULT_STORE_OPERATION_TIMEOUT_MS: u64 = 2000;

// =============================================================================
// Cache defaults
// =============================================================================

/// Pool list cache TTL in milliseconds
pub const DEFAULT_POOL_TTL_MS: u64 = 5000;

/// Pool list cache capacity (entries, one per pool key)
pub const DEFAULT_POOL_CAPACITY: u64 = 10;

/// Affinity cache TTL in milliseconds
pub const DEFAULT_AFFINITY_TTL_MS: u64 = 1000;

/// Affinity cache capacity (sessions)
pub const DEFAULT_AFFINITY_CAPACITY: u64 = 1000;

// =============================================================================
// Backend defaults
// =============================================================================

/// Default timeout for create/pointsCount/destroy backend calls in milliseconds
pub const DEFAULT_BACKEND_REQUEST_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// Streaming defaults
// =============================================================================

/// Address the streaming bridge listens on
pub const DEFAULT_STREAMING_BIND_ADDRESS: &str = "127.0.0.1";

/// Read buffer size for forwarding point data, in bytes
pub const DEFAULT_STREAMING_CHUNK_SIZE: usize = 64 * 1024;

/// How long an armed bridge waits for the backend to connect, in milliseconds
pub const DEFAULT_STREAMING_ACCEPT_TIMEOUT_MS: u64 = 30_000;

/// Bytes held for a bridge that is not armed yet before reads pause
pub const DEFAULT_STREAMING_MAX_PENDING_BYTES: usize = 1024 * 1024;
