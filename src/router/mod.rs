//! Command router
//!
//! Turns client commands into backend calls. `create` picks a backend and
//! pins the new session to it; every other command resolves the session's
//! backend through the affinity store first.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

pub mod completion;

pub use completion::Completion;

use crate::affinity::AffinityStore;
use crate::backend::BackendClient;
use crate::config::{Config, ConfigError};
use crate::error::GatewayError;
use crate::pool::BackendPool;
use crate::protocol::Command;
use crate::store::SharedStore;
use crate::streaming::StreamingCoordinator;

pub struct CommandRouter {
    pool: Arc<BackendPool>,
    affinity: Arc<AffinityStore>,
    backend: Arc<dyn BackendClient>,
    streaming: StreamingCoordinator,
}

impl CommandRouter {
    pub fn new(
        pool: Arc<BackendPool>,
        affinity: Arc<AffinityStore>,
        backend: Arc<dyn BackendClient>,
        streaming: StreamingCoordinator,
    ) -> Self {
        Self {
            pool,
            affinity,
            backend,
            streaming,
        }
    }

    /// Wire the pool cache, affinity store and streaming coordinator from configuration
    pub fn from_config(
        store: Arc<dyn SharedStore>,
        backend: Arc<dyn BackendClient>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        let pool = BackendPool::new(Arc::clone(&store), config.store.pool_key.clone(), &config.cache);
        let affinity = AffinityStore::new(store, config.store.affinity_key.clone(), &config.cache);
        let streaming = StreamingCoordinator::new(Arc::clone(&backend), &config.streaming)?;

        Ok(Self::new(
            Arc::new(pool),
            Arc::new(affinity),
            backend,
            streaming,
        ))
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    pub fn affinity(&self) -> &AffinityStore {
        &self.affinity
    }

    /// Run one command to completion
    pub async fn dispatch(&self, command: Command, completion: Completion) {
        match command {
            Command::Create => {
                let outcome = self
                    .create()
                    .await
                    .map(|session| json!({ "session": session }));
                completion.complete(outcome);
            }
            Command::PointsCount { session } => {
                completion.complete(self.points_count(session.as_deref()).await);
            }
            Command::Destroy { session } => {
                let outcome = self.destroy(session.as_deref()).await.map(|()| Value::Null);
                completion.complete(outcome);
            }
            Command::Read {
                session,
                start,
                count,
            } => match self.resolve(session.as_deref()).await {
                Ok((session, backend)) => {
                    self.streaming
                        .read(&backend, session, start, count, completion)
                        .await;
                }
                Err(e) => completion.complete(Err(e)),
            },
        }
    }

    /// Create a session on a freshly picked backend and pin it there
    pub async fn create(&self) -> Result<String, GatewayError> {
        let backend = self.pool.pick_backend().await?;
        let session = self.backend.create(&backend).await?.session_id;

        if let Err(e) = self.affinity.set_affinity(&session, &backend).await {
            warn!(session = %session, backend = %backend, error = %e, "affinity write failed, destroying orphan session");
            if let Err(undo) = self.backend.destroy(&backend, &session).await {
                warn!(session = %session, backend = %backend, error = %undo, "failed to destroy orphan session");
            }
            return Err(e);
        }

        debug!(session = %session, backend = %backend, "session created");
        Ok(session)
    }

    pub async fn points_count(&self, session: Option<&str>) -> Result<Value, GatewayError> {
        let (session, backend) = self.resolve(session).await?;
        self.backend.points_count(&backend, session).await
    }

    /// Destroy a session; a failure to drop its affinity afterwards is only logged
    pub async fn destroy(&self, session: Option<&str>) -> Result<(), GatewayError> {
        let (session, backend) = self.resolve(session).await?;
        self.backend.destroy(&backend, session).await?;

        if let Err(e) = self.affinity.delete_affinity(session).await {
            warn!(session, error = %e, "session destroyed but affinity was not removed");
        }
        Ok(())
    }

    /// Validate a session parameter and find the backend it is pinned to
    async fn resolve<'a>(&self, session: Option<&'a str>) -> Result<(&'a str, String), GatewayError> {
        let session = validate_session(session)?;
        match self.affinity.get_affinity(session).await? {
            Some(backend) => {
                debug!(session, backend = %backend, "session resolved");
                Ok((session, backend))
            }
            None => Err(GatewayError::InvalidSession(format!(
                "unknown session '{}'",
                session
            ))),
        }
    }
}

fn validate_session(session: Option<&str>) -> Result<&str, GatewayError> {
    match session {
        Some(s) if !s.is_empty() => Ok(s),
        Some(_) => Err(GatewayError::InvalidSession("session is empty".to_string())),
        None => Err(GatewayError::InvalidSession("session is missing".to_string())),
    }
}
