//! Shared store abstraction
//!
//! The gateway keeps all of its durable state (backend pool, session
//! affinity, routing table registration) in a shared key-value store. This
//! module defines the handful of list and hash operations the gateway needs
//! and the implementations behind them:
//! - `RedisStore`: production store backed by a Redis `ConnectionManager`
//! - `MemoryStore`: in-process store with failure injection for tests

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Shared store error types
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Could not connect to the store
    #[error("Store connection failed: {0}")]
    ConnectionFailed(String),
    /// The store rejected or failed an operation
    #[error("Store operation failed: {0}")]
    OperationFailed(String),
    /// The operation did not complete within the configured timeout
    #[error("Store operation timed out after {0}ms")]
    Timeout(u64),
}

/// Operations the gateway requires from the shared store
///
/// Lists are ordered and allow duplicates. Indices follow Redis semantics:
/// `stop` is inclusive and negative indices count from the tail.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Read a range of a list. Missing keys read as an empty list.
    async fn lrange(&self, key: &str, start: isize, stop: isize)
        -> Result<Vec<String>, StoreError>;

    /// Append a value to the tail of a list, returning the new length
    async fn rpush(&self, key: &str, value: &str) -> Result<usize, StoreError>;

    /// Remove the first `count` occurrences of `value` (all when `count` is 0).
    /// Returns the number removed; removing an absent value is not an error.
    async fn lrem(&self, key: &str, count: isize, value: &str) -> Result<usize, StoreError>;

    /// Read a field of a hash
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Write a field of a hash
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a field of a hash, returning whether it existed
    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError>;
}
