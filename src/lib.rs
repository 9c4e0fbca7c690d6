// Point Gateway Library
//
// Affinity-aware WebSocket gateway in front of a pool of request handlers.

pub mod affinity;
pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pool;
pub mod protocol;
pub mod registration;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod stats;
pub mod store;
pub mod streaming;
