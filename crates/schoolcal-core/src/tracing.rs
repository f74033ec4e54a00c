//! Log output for whatever embeds the calendar cache.
//!
//! The library crates only emit `tracing` events. A host calls
//! [`init_tracing`] once at startup to print them; `RUST_LOG` takes
//! precedence over the level passed in.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors from [`init_tracing`].
#[derive(Debug, Error)]
pub enum TracingError {
    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human-readable text.
    #[default]
    Text,
    /// One JSON object per line, for a long-running refresh worker.
    Json,
}

/// Installs the global subscriber.
///
/// Events from the `schoolcal*` crates are shown at `level` and above
/// unless `RUST_LOG` is set.
///
/// # Errors
///
/// Returns [`TracingError::Init`] if a global subscriber is already set.
pub fn init_tracing(level: Level, format: LogFormat) -> Result<(), TracingError> {
    let filter = env_filter(level);
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer().compact()).try_init()?,
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
    }
    Ok(())
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)))
}

fn default_directive(level: Level) -> String {
    format!("schoolcal={}", level.as_str().to_ascii_lowercase())
}
