// Termination signal handling
//
// SIGHUP, SIGINT and SIGTERM all end the process gracefully so that the
// gateway can remove itself from the routing table first.

use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use std::io;
use tokio::signal::unix::{signal, SignalKind};

pub fn signal_name(signum: i32) -> &'static str {
    match signum {
        SIGHUP => "SIGHUP",
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        _ => "unknown",
    }
}

/// Listens for the shutdown signals
///
/// Handlers are installed on construction, so signals arriving between
/// `install` and `recv` are not lost.
pub struct ShutdownSignals {
    hangup: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            hangup: signal(SignalKind::from_raw(SIGHUP))?,
            interrupt: signal(SignalKind::from_raw(SIGINT))?,
            terminate: signal(SignalKind::from_raw(SIGTERM))?,
        })
    }

    /// Wait for the first shutdown signal and return its number
    pub async fn recv(&mut self) -> i32 {
        tokio::select! {
            _ = self.hangup.recv() => SIGHUP,
            _ = self.interrupt.recv() => SIGINT,
            _ = self.terminate.recv() => SIGTERM,
        }
    }
}
