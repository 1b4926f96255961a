//! Logging setup for the host process.

use invsync_core::config::GeneralConfig;
use tracing_subscriber::EnvFilter;

use crate::error::HostError;

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `config.log_level` applies to the
/// invsync crates. Calling this twice is an error, not a panic.
///
/// # Errors
///
/// Returns [`HostError::Tracing`] for a bad filter or if a subscriber is
/// already installed.
pub fn init_tracing(config: &GeneralConfig) -> Result<(), HostError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => default_filter(&config.log_level)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| HostError::Tracing(e.to_string()))
}

fn default_filter(level: &str) -> Result<EnvFilter, HostError> {
    EnvFilter::try_new(format!("invsync_core={level},invsync_host={level}"))
        .map_err(|e| HostError::Tracing(e.to_string()))
}
