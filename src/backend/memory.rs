//! In-process request handler for testing
//!
//! Behaves like a set of request handlers reachable under any backend
//! address: sessions are issued per backend and only that backend answers
//! for them. `read` connects to the requested host/port and pushes each
//! point as 8 little-endian bytes before replying, like a real handler that
//! streams first and reports afterwards.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::{BackendClient, CreateResponse, ReadRequest, ReadResponse};
use crate::error::GatewayError;

/// Size of one synthetic point in bytes
pub const POINT_SIZE: u64 = 8;

/// A call that reached the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub backend: String,
    pub kind: &'static str,
    pub session: Option<String>,
}

#[derive(Default)]
struct Flags {
    create: AtomicBool,
    points_count: AtomicBool,
    destroy: AtomicBool,
    read: AtomicBool,
}

/// Backend with sessions kept in memory
#[derive(Clone)]
pub struct InMemoryBackend {
    /// session id -> (owning backend, point count)
    sessions: Arc<RwLock<HashMap<String, (String, u64)>>>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    next_id: Arc<AtomicU64>,
    points_per_session: u64,
    fail: Arc<Flags>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(100)
    }
}

impl InMemoryBackend {
    /// Every new session holds `points_per_session` points
    pub fn new(points_per_session: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            points_per_session,
            fail: Arc::new(Flags::default()),
        }
    }

    pub fn set_fail_create(&self, enabled: bool) {
        self.fail.create.store(enabled, Ordering::SeqCst);
    }

    pub fn set_fail_points_count(&self, enabled: bool) {
        self.fail.points_count.store(enabled, Ordering::SeqCst);
    }

    pub fn set_fail_destroy(&self, enabled: bool) {
        self.fail.destroy.store(enabled, Ordering::SeqCst);
    }

    pub fn set_fail_read(&self, enabled: bool) {
        self.fail.read.store(enabled, Ordering::SeqCst);
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Calls of one kind
    pub fn calls_of(&self, kind: &str) -> Vec<BackendCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect()
    }

    /// Backend owning a live session
    pub fn owner(&self, session: &str) -> Option<String> {
        self.sessions.read().get(session).map(|(b, _)| b.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Bytes a read of `[start, start + count)` produces
    pub fn expected_bytes(start: u64, count: u64) -> Vec<u8> {
        (start..start + count).flat_map(|i| i.to_le_bytes()).collect()
    }

    fn record(&self, backend: &str, kind: &'static str, session: Option<&str>) {
        self.calls.lock().push(BackendCall {
            backend: backend.to_string(),
            kind,
            session: session.map(str::to_string),
        });
    }

    fn check(&self, flag: &AtomicBool, backend: &str) -> Result<(), GatewayError> {
        if flag.load(Ordering::SeqCst) {
            return Err(GatewayError::BackendError {
                backend: backend.to_string(),
                status: Some(500),
                detail: "simulated failure".to_string(),
            });
        }
        Ok(())
    }

    fn session_points(&self, backend: &str, session: &str) -> Result<u64, GatewayError> {
        match self.sessions.read().get(session) {
            Some((owner, points)) if owner == backend => Ok(*points),
            _ => Err(GatewayError::BackendError {
                backend: backend.to_string(),
                status: Some(404),
                detail: format!("unknown session {}", session),
            }),
        }
    }
}

#[async_trait]
impl BackendClient for InMemoryBackend {
    async fn create(&self, backend: &str) -> Result<CreateResponse, GatewayError> {
        self.record(backend, "create", None);
        self.check(&self.fail.create, backend)?;

        let session_id = format!("session-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sessions.write().insert(
            session_id.clone(),
            (backend.to_string(), self.points_per_session),
        );
        Ok(CreateResponse { session_id })
    }

    async fn points_count(&self, backend: &str, session: &str) -> Result<Value, GatewayError> {
        self.record(backend, "pointsCount", Some(session));
        self.check(&self.fail.points_count, backend)?;

        let points = self.session_points(backend, session)?;
        Ok(json!({ "count": points }))
    }

    async fn destroy(&self, backend: &str, session: &str) -> Result<(), GatewayError> {
        self.record(backend, "destroy", Some(session));
        self.check(&self.fail.destroy, backend)?;

        self.session_points(backend, session)?;
        self.sessions.write().remove(session);
        Ok(())
    }

    async fn read(
        &self,
        backend: &str,
        session: &str,
        request: &ReadRequest,
    ) -> Result<ReadResponse, GatewayError> {
        self.record(backend, "read", Some(session));
        self.check(&self.fail.read, backend)?;

        let points = self.session_points(backend, session)?;
        let start = request.start.unwrap_or(0).min(points);
        let count = request
            .count
            .unwrap_or(points)
            .min(points - start);
        let data = Self::expected_bytes(start, count);

        let push = async {
            let mut stream = TcpStream::connect((request.host.as_str(), request.port)).await?;
            stream.write_all(&data).await?;
            stream.shutdown().await
        };
        push.await.map_err(|e: std::io::Error| {
            GatewayError::backend_unreachable(backend, format!("failed to push points: {}", e))
        })?;

        Ok(ReadResponse {
            points_read: count,
            bytes_count: count * POINT_SIZE,
            extra: Map::new(),
        })
    }
}
