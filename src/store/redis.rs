// Redis shared store implementation
//
// Uses a multiplexed ConnectionManager so a single connection is shared by
// every connection handler; the manager reconnects on its own after errors.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use super::{SharedStore, StoreError};
use crate::config::StoreConfig;

/// Redis-backed shared store
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    operation_timeout: Duration,
}

impl RedisStore {
    /// Connect to Redis using the store configuration
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` if the URL is invalid or the
    /// server cannot be reached within `connection_timeout_ms`.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.redis_url.as_str())
            .map_err(|e| StoreError::ConnectionFailed(format!("Invalid Redis URL: {}", e)))?;

        let connect_timeout = Duration::from_millis(config.connection_timeout_ms);
        let connection = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                StoreError::ConnectionFailed(format!(
                    "Timed out after {}ms connecting to Redis",
                    config.connection_timeout_ms
                ))
            })?
            .map_err(|e| StoreError::ConnectionFailed(format!("Failed to connect to Redis: {}", e)))?;

        info!(redis_url = %redacted_url(&config.redis_url), "Connection to redis server established");

        Ok(Self {
            connection,
            operation_timeout: Duration::from_millis(config.operation_timeout_ms),
        })
    }

    /// Run one command against a cloned connection handle, bounded by the
    /// operation timeout
    async fn run<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let timeout_ms = self.operation_timeout.as_millis() as u64;
        match tokio::time::timeout(self.operation_timeout, f(self.connection.clone())).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                debug!(op, error = %e, "redis command failed");
                Err(StoreError::OperationFailed(format!("{}: {}", op, e)))
            }
            Err(_) => Err(StoreError::Timeout(timeout_ms)),
        }
    }
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        self.run("LRANGE", |mut conn| async move {
            conn.lrange(key, start, stop).await
        })
        .await
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        self.run("RPUSH", |mut conn| async move { conn.rpush(key, value).await })
            .await
    }

    async fn lrem(&self, key: &str, count: isize, value: &str) -> Result<usize, StoreError> {
        self.run("LREM", |mut conn| async move {
            conn.lrem(key, count, value).await
        })
        .await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.run("HGET", |mut conn| async move { conn.hget(key, field).await })
            .await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.run("HSET", |mut conn| async move {
            let _: i64 = conn.hset(key, field, value).await?;
            Ok(())
        })
        .await
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.run("HDEL", |mut conn| async move {
            let removed: i64 = conn.hdel(key, field).await?;
            Ok(removed > 0)
        })
        .await
    }
}

/// Strip credentials from a Redis URL before logging it
fn redacted_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
