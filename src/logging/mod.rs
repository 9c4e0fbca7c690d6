// Logging module for structured logging using the tracing crate

use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Output format for log events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event, for log aggregation systems
    #[default]
    Json,
    /// Human readable output for local development
    Pretty,
}

/// Logging configuration section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Initialize the tracing subscriber with JSON output
///
/// Equivalent to `init_with_format(LogFormat::Json)`.
///
/// # Examples
///
/// ```
/// use point_gateway::logging::init_subscriber;
///
/// init_subscriber().expect("Failed to initialize logging");
/// tracing::info!("gateway starting");
/// ```
pub fn init_subscriber() -> Result<(), Box<dyn Error>> {
    init_with_format(LogFormat::Json)
}

/// Initialize the tracing subscriber
///
/// The filter is taken from `RUST_LOG` and defaults to `info`. Output goes
/// to stdout. Calling this more than once is not an error: the first
/// subscriber stays installed, which lets tests initialize freely.
pub fn init_with_format(format: LogFormat) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let result = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init(),
        LogFormat::Pretty => fmt().with_env_filter(filter).with_target(false).try_init(),
    };

    // A global subscriber already being set is fine
    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }

    Ok(())
}
