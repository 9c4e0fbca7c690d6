//! Request handler (backend) API
//!
//! Request handlers own the point data and the sessions; the gateway only
//! forwards calls to them. This module defines the four calls the gateway
//! makes and their payloads. `HttpBackendClient` is the production
//! implementation, `InMemoryBackend` an in-process one for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GatewayError;

pub mod http;
pub mod memory;

pub use http::HttpBackendClient;
pub use memory::InMemoryBackend;

/// Response of `POST /create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub session_id: String,
}

/// Body of `POST /read/{session}`: where to push the points and which ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRequest {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Response of `POST /read/{session}`
///
/// Extra fields returned by the backend are kept and passed on to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResponse {
    pub points_read: u64,
    pub bytes_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Calls the gateway makes on a request handler
///
/// `backend` is the base address taken from the pool list.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// `POST {backend}/create`
    async fn create(&self, backend: &str) -> Result<CreateResponse, GatewayError>;

    /// `GET {backend}/pointsCount/{session}`, payload passed through untouched
    async fn points_count(&self, backend: &str, session: &str) -> Result<Value, GatewayError>;

    /// `DELETE {backend}/{session}`
    async fn destroy(&self, backend: &str, session: &str) -> Result<(), GatewayError>;

    /// `POST {backend}/read/{session}`
    async fn read(
        &self,
        backend: &str,
        session: &str,
        request: &ReadRequest,
    ) -> Result<ReadResponse, GatewayError>;
}
