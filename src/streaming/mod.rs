//! Streaming coordinator for `read`
//!
//! A read is served out of band: the gateway opens a TCP listener, asks the
//! backend to push the requested points to it, answers the command with the
//! backend's metadata and then forwards the pushed bytes to the client as
//! binary frames.

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod bridge;

pub use bridge::{BridgeEnd, BridgeOptions, BridgeState, TcpBridge};

use crate::backend::{BackendClient, ReadRequest};
use crate::config::{ConfigError, StreamingConfig};
use crate::error::GatewayError;
use crate::router::Completion;

pub struct StreamingCoordinator {
    backend: Arc<dyn BackendClient>,
    bind_ip: IpAddr,
    advertise_host: Option<String>,
    options: BridgeOptions,
}

impl StreamingCoordinator {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        config: &StreamingConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            backend,
            bind_ip: config.bind_ip()?,
            advertise_host: config.advertise_host.clone(),
            options: config.options(),
        })
    }

    /// Serve a read of `session` on `backend`, settling `completion`
    ///
    /// Returns once the bridge has finished, which may be well after the
    /// completion was sent. A read the backend reports as empty closes the
    /// bridge straight away; otherwise the backend has the accept timeout to
    /// connect.
    pub async fn read(
        &self,
        backend: &str,
        session: &str,
        start: Option<u64>,
        count: Option<u64>,
        completion: Completion,
    ) {
        let bridge = match TcpBridge::bind(self.bind_ip, completion.sink(), self.options).await {
            Ok(bridge) => bridge,
            Err(e) => {
                completion.complete(Err(e));
                return;
            }
        };

        let local = bridge.local_addr();
        let request = ReadRequest {
            host: self
                .advertise_host
                .clone()
                .unwrap_or_else(|| local.ip().to_string()),
            port: local.port(),
            start,
            count,
        };
        debug!(session, backend, host = %request.host, port = request.port, "requesting read");

        let response = match self.backend.read(backend, session, &request).await {
            Ok(response) => response,
            Err(e) => {
                bridge.close();
                completion.complete(Err(e));
                let end = bridge.finished().await;
                debug!(session, end = ?end, "streaming bridge closed after failed read");
                return;
            }
        };

        let metadata = match serde_json::to_value(&response) {
            Ok(value) => value,
            Err(e) => {
                bridge.close();
                completion.complete(Err(GatewayError::Internal(format!(
                    "failed to encode read response: {}",
                    e
                ))));
                return;
            }
        };
        info!(
            session,
            points_read = response.points_read,
            bytes_count = response.bytes_count,
            "streaming points"
        );

        completion.complete(Ok(metadata));
        if response.bytes_count == 0 {
            bridge.close();
            let end = bridge.finished().await;
            info!(session, end = ?end, "end of transmission (empty read)");
            return;
        }
        tokio::task::yield_now().await;
        bridge.start_pushing();

        match bridge.finished().await {
            BridgeEnd::Eof { bytes } => {
                info!(session, bytes, "end of transmission");
                if bytes != response.bytes_count {
                    warn!(
                        session,
                        bytes,
                        expected = response.bytes_count,
                        "streamed byte count differs from backend report"
                    );
                }
            }
            BridgeEnd::ClientGone => debug!(session, "client went away during streaming"),
            BridgeEnd::AcceptTimeout => warn!(
                session,
                backend,
                expected = response.bytes_count,
                "backend never connected to streaming bridge"
            ),
            other => warn!(session, end = ?other, "streaming ended early"),
        }
    }
}
