// One-shot completion handle for a client command

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::protocol::{completion_text, Outbound};

/// Settles one command exactly once
///
/// `complete` consumes the handle. A handle dropped without being completed
/// reports an `Internal` error to the client instead of leaving the command
/// unanswered.
pub struct Completion {
    id: Value,
    command: &'static str,
    sink: UnboundedSender<Outbound>,
    settled: bool,
}

impl Completion {
    pub fn new(id: Value, command: &'static str, sink: UnboundedSender<Outbound>) -> Self {
        Self {
            id,
            command,
            sink,
            settled: false,
        }
    }

    pub fn id(&self) -> &Value {
        &self.id
    }

    /// Outbound channel of the connection that issued the command
    pub fn sink(&self) -> UnboundedSender<Outbound> {
        self.sink.clone()
    }

    pub fn complete(mut self, outcome: Result<Value, GatewayError>) {
        self.settled = true;
        self.send(&outcome);
    }

    fn send(&self, outcome: &Result<Value, GatewayError>) {
        if let Err(e) = outcome {
            debug!(id = %self.id, command = self.command, code = e.code(), error = %e, "command failed");
        }
        if self.sink.send(Outbound::Text(completion_text(&self.id, outcome))).is_err() {
            debug!(id = %self.id, command = self.command, "connection closed, completion discarded");
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.settled {
            warn!(id = %self.id, command = self.command, "command dropped without a result");
            self.send(&Err(GatewayError::Internal(
                "command ended without a result".to_string(),
            )));
        }
    }
}
