// TCP → WebSocket bridge for one read
//
// The backend connects to an ephemeral listener and pushes raw point data.
// Bytes are forwarded as binary frames to the client connection only once
// the bridge is armed; anything received earlier is held back and flushed
// first, so the read metadata always precedes the data. Reads pause once
// the held-back bytes reach the configured cap, leaving the backend to TCP
// backpressure until the bridge is armed.

use bytes::Bytes;
use std::collections::VecDeque;
use std::future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::error::GatewayError;
use crate::protocol::Outbound;

/// Bridge lifecycle: Idle → Bound → Streaming → Closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Bound,
    Streaming,
    Closed,
}

/// Why a bridge finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEnd {
    /// The backend closed its stream after `bytes` bytes were forwarded
    Eof { bytes: u64 },
    /// Closed by the gateway before the stream ended
    Closed,
    /// The client connection went away
    ClientGone,
    /// Armed, but the backend never connected
    AcceptTimeout,
    Failed(String),
}

/// Per-bridge limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Maximum bytes per binary frame
    pub chunk_size: usize,
    /// How long an armed bridge waits for the backend to connect
    pub accept_timeout: Duration,
    /// Bytes held back before arming; reads pause past this
    pub max_pending_bytes: usize,
}

pub struct TcpBridge {
    local_addr: SocketAddr,
    state: Arc<watch::Sender<BridgeState>>,
    task: Option<JoinHandle<BridgeEnd>>,
}

impl TcpBridge {
    /// Open an ephemeral listener on `ip` forwarding into `sink`
    pub async fn bind(
        ip: IpAddr,
        sink: UnboundedSender<Outbound>,
        options: BridgeOptions,
    ) -> Result<Self, GatewayError> {
        let (state, control) = watch::channel(BridgeState::Idle);
        let state = Arc::new(state);

        let listener = TcpListener::bind(SocketAddr::new(ip, 0))
            .await
            .map_err(|e| GatewayError::Bridge(format!("failed to bind on {}: {}", ip, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bridge(e.to_string()))?;

        state.send_replace(BridgeState::Bound);
        debug!(local_addr = %local_addr, "streaming bridge bound");

        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            let end = run(listener, control, sink, options).await;
            task_state.send_replace(BridgeState::Closed);
            end
        });

        Ok(Self {
            local_addr,
            state,
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> BridgeState {
        *self.state.borrow()
    }

    /// Start forwarding data to the client (Bound → Streaming)
    pub fn start_pushing(&self) {
        self.state.send_if_modified(|state| {
            if *state == BridgeState::Bound {
                *state = BridgeState::Streaming;
                true
            } else {
                false
            }
        });
    }

    /// Stop the bridge and drop any data not yet forwarded
    pub fn close(&self) {
        self.state.send_if_modified(|state| {
            if *state != BridgeState::Closed {
                *state = BridgeState::Closed;
                true
            } else {
                false
            }
        });
    }

    /// Wait for the bridge to finish
    pub async fn finished(mut self) -> BridgeEnd {
        match self.task.take() {
            Some(task) => task
                .await
                .unwrap_or_else(|e| BridgeEnd::Failed(format!("bridge task failed: {}", e))),
            None => BridgeEnd::Closed,
        }
    }
}

impl Drop for TcpBridge {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.close();
        }
    }
}

/// Wait until the bridge is armed. Returns false if it was closed instead.
async fn armed(control: &mut watch::Receiver<BridgeState>) -> bool {
    loop {
        match *control.borrow_and_update() {
            BridgeState::Streaming => return true,
            BridgeState::Closed => return false,
            _ => {}
        }
        if control.changed().await.is_err() {
            return false;
        }
    }
}

async fn run(
    listener: TcpListener,
    mut control: watch::Receiver<BridgeState>,
    sink: UnboundedSender<Outbound>,
    options: BridgeOptions,
) -> BridgeEnd {
    let mut deadline = None;
    let socket: TcpStream = loop {
        if deadline.is_none() && *control.borrow() == BridgeState::Streaming {
            deadline = Some(Box::pin(sleep(options.accept_timeout)));
        }
        let accept_expired = async {
            match deadline.as_mut() {
                Some(timer) => timer.as_mut().await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    debug!(peer = %peer, "backend connected to streaming bridge");
                    break socket;
                }
                Err(e) => return BridgeEnd::Failed(format!("accept failed: {}", e)),
            },
            changed = control.changed() => {
                if changed.is_err() || *control.borrow() == BridgeState::Closed {
                    return BridgeEnd::Closed;
                }
            }
            _ = accept_expired => {
                debug!(timeout = ?options.accept_timeout, "backend never connected to streaming bridge");
                return BridgeEnd::AcceptTimeout;
            }
            _ = sink.closed() => return BridgeEnd::ClientGone,
        }
    };
    drop(listener);

    forward(socket, control, sink, options).await
}

async fn forward(
    mut socket: TcpStream,
    mut control: watch::Receiver<BridgeState>,
    sink: UnboundedSender<Outbound>,
    options: BridgeOptions,
) -> BridgeEnd {
    let mut buf = vec![0u8; options.chunk_size.max(1)];
    let mut pending: VecDeque<Bytes> = VecDeque::new();
    let mut pending_bytes: usize = 0;
    let mut forwarded: u64 = 0;

    loop {
        let state = *control.borrow();
        match state {
            BridgeState::Closed => return BridgeEnd::Closed,
            BridgeState::Streaming => {
                while let Some(chunk) = pending.pop_front() {
                    forwarded += chunk.len() as u64;
                    if sink.send(Outbound::Binary(chunk)).is_err() {
                        return BridgeEnd::ClientGone;
                    }
                }
                pending_bytes = 0;
            }
            _ => {}
        }

        tokio::select! {
            read = socket.read(&mut buf), if pending_bytes < options.max_pending_bytes => match read {
                Ok(0) => {
                    if !pending.is_empty() {
                        if !armed(&mut control).await {
                            return BridgeEnd::Closed;
                        }
                        while let Some(chunk) = pending.pop_front() {
                            forwarded += chunk.len() as u64;
                            if sink.send(Outbound::Binary(chunk)).is_err() {
                                return BridgeEnd::ClientGone;
                            }
                        }
                    }
                    return BridgeEnd::Eof { bytes: forwarded };
                }
                Ok(n) => {
                    let chunk = Bytes::copy_from_slice(&buf[..n]);
                    if *control.borrow() == BridgeState::Streaming && pending.is_empty() {
                        forwarded += n as u64;
                        if sink.send(Outbound::Binary(chunk)).is_err() {
                            return BridgeEnd::ClientGone;
                        }
                    } else {
                        pending_bytes += n;
                        pending.push_back(chunk);
                    }
                }
                Err(e) => return BridgeEnd::Failed(format!("read failed: {}", e)),
            },
            changed = control.changed() => {
                if changed.is_err() {
                    return BridgeEnd::Closed;
                }
            }
            _ = sink.closed() => return BridgeEnd::ClientGone,
        }
    }
}
