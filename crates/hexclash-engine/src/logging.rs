//! Structured logging setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies, and
//! `info` if that does not parse either.

use hexclash_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Build the level filter for `config`.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`EngineError::Logging`] if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<(), EngineError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true);

    let installed = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}
