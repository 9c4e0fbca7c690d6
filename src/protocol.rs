//! WebSocket message protocol
//!
//! Inbound text frames carry one command each:
//!
//! ```json
//! {"id": 7, "type": "read", "session": "s-1", "start": 0, "count": 1000}
//! ```
//!
//! Every command is answered by exactly one completion text frame carrying
//! the same `id`, either `{"id", "result"}` or
//! `{"id", "error": {"code", "message"}}`. Point data streamed for `read`
//! goes out as binary frames after the completion.

use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::GatewayError;

/// Frames queued for a client connection, written in FIFO order
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Binary(Bytes),
}

/// A client command
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Create,
    PointsCount {
        #[serde(default)]
        session: Option<String>,
    },
    Destroy {
        #[serde(default)]
        session: Option<String>,
    },
    Read {
        #[serde(default)]
        session: Option<String>,
        #[serde(default)]
        start: Option<u64>,
        #[serde(default)]
        count: Option<u64>,
    },
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Create => "create",
            Command::PointsCount { .. } => "pointsCount",
            Command::Destroy { .. } => "destroy",
            Command::Read { .. } => "read",
        }
    }
}

/// A parsed inbound frame
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub id: Value,
    pub command: Command,
}

/// A frame that could not be turned into a command
///
/// `id` is `null` when the frame did not carry one.
#[derive(Debug, Clone)]
pub struct Rejected {
    pub id: Value,
    pub error: GatewayError,
}

/// Parse an inbound text frame
pub fn parse_envelope(text: &str) -> Result<Envelope, Rejected> {
    let value: Value = serde_json::from_str(text).map_err(|e| Rejected {
        id: Value::Null,
        error: GatewayError::InvalidCommand(format!("malformed JSON: {}", e)),
    })?;

    let id = match &value {
        Value::Object(map) => map.get("id").cloned().unwrap_or(Value::Null),
        _ => {
            return Err(Rejected {
                id: Value::Null,
                error: GatewayError::InvalidCommand("command must be a JSON object".to_string()),
            })
        }
    };

    match serde_json::from_value::<Command>(value) {
        Ok(command) => Ok(Envelope { id, command }),
        Err(e) => Err(Rejected {
            id,
            error: GatewayError::InvalidCommand(e.to_string()),
        }),
    }
}

/// Completion frame for a command outcome
pub fn completion_text(id: &Value, outcome: &Result<Value, GatewayError>) -> String {
    let message = match outcome {
        Ok(result) => json!({ "id": id, "result": result }),
        Err(error) => json!({
            "id": id,
            "error": {
                "code": error.code(),
                "message": error.to_string(),
            }
        }),
    };
    message.to_string()
}
