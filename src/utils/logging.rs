//! Logging initialization for RelayBot.
//!
//! Supports three formats:
//! - `pretty`: default tracing pretty-print (human-readable, coloured)
//! - `component`: compact single-line output; use the [`log_component!`]
//!   macro to add a `component` field for per-subsystem filtering
//! - `json`: structured JSON lines for log aggregators
//!
//! Logs always go to stderr (or the configured file) so stdout stays free
//! for command output.

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{RelayError, Result};

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted.
/// `RUST_LOG` takes precedence over `cfg.level`.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    let file = match &cfg.file {
        Some(path) => Some(Arc::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match (cfg.format, file) {
        (LogFormat::Json, Some(file)) => builder.json().with_writer(file).try_init(),
        (LogFormat::Json, None) => builder.json().with_writer(std::io::stderr).try_init(),
        (LogFormat::Pretty, Some(file)) => builder.pretty().with_writer(file).try_init(),
        (LogFormat::Pretty, None) => builder.pretty().with_writer(std::io::stderr).try_init(),
        // Component-tagged events carry a structured `component` field via
        // `log_component!`, so the compact formatter is enough.
        (LogFormat::Component, Some(file)) => builder
            .with_target(true)
            .compact()
            .with_writer(file)
            .try_init(),
        (LogFormat::Component, None) => builder
            .with_target(true)
            .compact()
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| RelayError::Config(format!("failed to install logger: {}", e)))
}

/// Emit a component-tagged tracing event.
///
/// Works with any tracing level (`trace`, `debug`, `info`, `warn`, `error`).
/// The `component` field makes it easy to grep logs by subsystem:
///
/// ```
/// # use relaybot::log_component;
/// log_component!(info, "context", "history compressed");
/// log_component!(warn, "context", "token budget low", used = 8000u64, limit = 10000u64);
/// ```
#[macro_export]
macro_rules! log_component {
    ($level:ident, $component:expr, $msg:expr) => {
        tracing::$level!(component = $component, $msg)
    };
    ($level:ident, $component:expr, $msg:expr, $($key:ident = $val:expr),+ $(,)?) => {
        tracing::$level!(component = $component, $($key = $val,)+ $msg)
    };
}
