// Test harness for integration tests
// Starts an in-process gateway on an ephemeral port, backed by the in-memory
// shared store and request handler, and provides a WebSocket test client.

use futures::{SinkExt, StreamExt};
use point_gateway::backend::InMemoryBackend;
use point_gateway::config::Config;
use point_gateway::router::CommandRouter;
use point_gateway::server::GatewayServer;
use point_gateway::store::MemoryStore;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Points held by every session of the in-memory backend
pub const POINTS_PER_SESSION: u64 = 1000;

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Gateway instance that stops when dropped
pub struct GatewayHarness {
    pub addr: SocketAddr,
    pub store: MemoryStore,
    pub backend: InMemoryBackend,
    stop: Option<oneshot::Sender<()>>,
}

impl GatewayHarness {
    /// Start a gateway whose backend pool holds `backends`
    pub async fn start(backends: &[&str]) -> Self {
        let store = MemoryStore::new();
        store.seed_list("rh", backends);
        Self::start_shared(
            store,
            InMemoryBackend::new(POINTS_PER_SESSION),
            Config::default(),
        )
        .await
    }

    /// Start a gateway on an existing store and backend, e.g. to run
    /// several gateway instances side by side
    pub async fn start_shared(store: MemoryStore, backend: InMemoryBackend, config: Config) -> Self {
        let router = CommandRouter::from_config(
            Arc::new(store.clone()),
            Arc::new(backend.clone()),
            &config,
        )
        .expect("router configuration");
        let server = GatewayServer::new(Arc::new(router), config.server.keepalive_interval());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = stop_rx.await;
                })
                .await;
        });

        Self {
            addr,
            store,
            backend,
            stop: Some(stop_tx),
        }
    }

    pub async fn client(&self) -> TestClient {
        let (ws, _) = connect_async(format!("ws://{}", self.addr))
            .await
            .expect("connect to gateway");
        TestClient { ws }
    }
}

impl Drop for GatewayHarness {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// A frame received from the gateway
#[derive(Debug)]
pub enum Frame {
    Text(Value),
    Binary(Vec<u8>),
}

pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn send(&mut self, message: Value) {
        self.send_raw(&message.to_string()).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string()))
            .await
            .expect("send frame");
    }

    /// Next text or binary frame, skipping control frames
    pub async fn next_frame(&mut self) -> Frame {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("connection closed")
                .expect("read frame");
            match message {
                Message::Text(text) => return Frame::Text(serde_json::from_str(&text).unwrap()),
                Message::Binary(data) => return Frame::Binary(data),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
                Message::Close(_) => panic!("gateway closed the connection"),
            }
        }
    }

    pub async fn next_text(&mut self) -> Value {
        match self.next_frame().await {
            Frame::Text(value) => value,
            Frame::Binary(data) => panic!("expected a completion, got {} bytes", data.len()),
        }
    }

    /// Send a command and wait for its completion
    pub async fn request(&mut self, message: Value) -> Value {
        self.send(message).await;
        self.next_text().await
    }

    /// Create a session and return its id
    pub async fn create(&mut self) -> String {
        let reply = self.request(json!({"id": "create", "type": "create"})).await;
        reply["result"]["session"]
            .as_str()
            .unwrap_or_else(|| panic!("create failed: {}", reply))
            .to_string()
    }

    /// Collect binary frames until `expected` bytes have arrived
    pub async fn read_bytes(&mut self, expected: u64) -> Vec<u8> {
        let mut data = Vec::new();
        while (data.len() as u64) < expected {
            match self.next_frame().await {
                Frame::Binary(chunk) => data.extend_from_slice(&chunk),
                Frame::Text(value) => panic!("unexpected completion while streaming: {}", value),
            }
        }
        data
    }
}

/// Error code of a completion, if it is an error
pub fn error_code(reply: &Value) -> Option<&str> {
    reply["error"]["code"].as_str()
}
