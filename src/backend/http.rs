// HTTP client for request handler backends
//
// Backends are addressed by the base address stored in the pool list,
// either a full URL or a bare host:port (http is assumed).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{BackendClient, CreateResponse, ReadRequest, ReadResponse};
use crate::config::BackendConfig;
use crate::error::GatewayError;

/// reqwest-based backend client
#[derive(Debug, Clone)]
pub struct HttpBackendClient {
    client: Client,
    request_timeout: Duration,
    read_timeout: Option<Duration>,
}

impl HttpBackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            request_timeout: config.request_timeout(),
            read_timeout: config.read_timeout(),
        })
    }

    async fn send(&self, backend: &str, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(|e| {
            let detail = if e.is_timeout() {
                format!("request timed out: {}", e)
            } else {
                e.to_string()
            };
            GatewayError::backend_unreachable(backend, detail)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        debug!(backend, status = status.as_u16(), detail = %detail, "backend call failed");

        Err(GatewayError::BackendError {
            backend: backend.to_string(),
            status: Some(status.as_u16()),
            detail,
        })
    }

    async fn json<T: DeserializeOwned>(
        &self,
        backend: &str,
        response: Response,
    ) -> Result<T, GatewayError> {
        let status = response.status().as_u16();
        response.json::<T>().await.map_err(|e| GatewayError::BackendError {
            backend: backend.to_string(),
            status: Some(status),
            detail: format!("invalid response body: {}", e),
        })
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn create(&self, backend: &str) -> Result<CreateResponse, GatewayError> {
        let url = format!("{}/create", base_url(backend));
        let request = self.client.post(url).timeout(self.request_timeout);
        let response = self.send(backend, request).await?;
        self.json(backend, response).await
    }

    async fn points_count(&self, backend: &str, session: &str) -> Result<Value, GatewayError> {
        let url = format!(
            "{}/pointsCount/{}",
            base_url(backend),
            urlencoding::encode(session)
        );
        let request = self.client.get(url).timeout(self.request_timeout);
        let response = self.send(backend, request).await?;
        self.json(backend, response).await
    }

    async fn destroy(&self, backend: &str, session: &str) -> Result<(), GatewayError> {
        let url = format!("{}/{}", base_url(backend), urlencoding::encode(session));
        let request = self.client.delete(url).timeout(self.request_timeout);
        self.send(backend, request).await?;
        Ok(())
    }

    async fn read(
        &self,
        backend: &str,
        session: &str,
        read: &ReadRequest,
    ) -> Result<ReadResponse, GatewayError> {
        let url = format!("{}/read/{}", base_url(backend), urlencoding::encode(session));
        let mut request = self.client.post(url).json(read);
        if let Some(timeout) = self.read_timeout {
            request = request.timeout(timeout);
        }
        let response = self.send(backend, request).await?;
        self.json(backend, response).await
    }
}

/// Base URL for a pool entry, without a trailing slash
pub fn base_url(backend: &str) -> String {
    let trimmed = backend.trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// Pull a human readable message out of an error body
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for field in ["message", "error"] {
            if let Some(Value::String(msg)) = map.get(field) {
                return Some(msg.clone());
            }
        }
    }
    Some(body.to_string())
}
