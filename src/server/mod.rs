// Server module - WebSocket listener and per-connection command loop

use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::protocol::{parse_envelope, Envelope, Outbound};
use crate::router::{CommandRouter, Completion};

impl From<Outbound> for Message {
    fn from(frame: Outbound) -> Self {
        match frame {
            Outbound::Text(text) => Message::Text(text),
            Outbound::Binary(data) => Message::Binary(data.to_vec()),
        }
    }
}

/// Accepts WebSocket clients and feeds their commands to the router
pub struct GatewayServer {
    router: Arc<CommandRouter>,
    keepalive: Option<Duration>,
}

impl GatewayServer {
    pub fn new(router: Arc<CommandRouter>, keepalive: Option<Duration>) -> Self {
        Self { router, keepalive }
    }

    /// Serve connections until `shutdown` resolves
    ///
    /// Connections already accepted keep running on their own tasks.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("WebSocket server stopping");
                    return;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let router = Arc::clone(&self.router);
                        let keepalive = self.keepalive;
                        tokio::spawn(handle_connection(router, stream, peer, keepalive));
                    }
                    Err(e) => warn!(error = %e, "failed to accept connection"),
                },
            }
        }
    }
}

async fn handle_connection(
    router: Arc<CommandRouter>,
    stream: TcpStream,
    peer: SocketAddr,
    keepalive: Option<Duration>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!(peer = %peer, error = %e, "WebSocket handshake failed");
            return;
        }
    };
    let connection_id = Uuid::new_v4().to_string();
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    info!(connection_id = %connection_id, peer = %peer, "client connected");

    let writer_id = connection_id.clone();
    let writer = tokio::spawn(async move {
        let mut ping = keepalive.map(|period| {
            let mut ping = interval(period);
            ping.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ping.reset();
            ping
        });

        loop {
            let next_ping = async {
                match ping.as_mut() {
                    Some(ping) => {
                        ping.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                frame = rx.recv() => match frame {
                    Some(frame) => {
                        if let Err(e) = ws_tx.send(frame.into()).await {
                            debug!(connection_id = %writer_id, error = %e, "failed to write frame");
                            break;
                        }
                    }
                    None => break,
                },
                _ = next_ping => {
                    if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = ws_tx.close().await;
    });

    while let Some(message) = ws_rx.next().await {
        match message {
            Ok(Message::Text(text)) => handle_text(&router, &text, &tx),
            Ok(Message::Binary(_)) => reject(
                &tx,
                serde_json::Value::Null,
                GatewayError::InvalidCommand("binary frames are not accepted".to_string()),
            ),
            Ok(Message::Close(_)) => break,
            // Pong replies to client pings are queued by tungstenite itself
            Ok(_) => {}
            Err(e) => {
                debug!(connection_id = %connection_id, error = %e, "WebSocket read error");
                break;
            }
        }
    }

    // In-flight commands keep running; their output is discarded
    drop(tx);
    writer.abort();
    info!(connection_id = %connection_id, peer = %peer, "client disconnected");
}

fn handle_text(router: &Arc<CommandRouter>, text: &str, sink: &UnboundedSender<Outbound>) {
    match parse_envelope(text) {
        Ok(Envelope { id, command }) => {
            debug!(id = %id, command = command.kind(), "command received");
            let completion = Completion::new(id, command.kind(), sink.clone());
            let router = Arc::clone(router);
            tokio::spawn(async move {
                router.dispatch(command, completion).await;
            });
        }
        Err(rejected) => reject(sink, rejected.id, rejected.error),
    }
}

fn reject(sink: &UnboundedSender<Outbound>, id: serde_json::Value, error: GatewayError) {
    warn!(id = %id, error = %error, "rejecting command");
    Completion::new(id, "invalid", sink.clone()).complete(Err(error));
}
