//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;
use warden_core::{LoggingConfig, WardenError, WardenResult};

/// Build the level filter: `RUST_LOG` when set, otherwise the configured level
pub fn env_filter(config: &LoggingConfig) -> WardenResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| WardenError::invalid(format!("bad log level '{}': {e}", config.level))),
    }
}

/// Install the global fmt subscriber.
///
/// Returns `false` when a subscriber was already installed, which is expected
/// when several tests or embedders initialize logging.
pub fn init_logging(config: &LoggingConfig) -> WardenResult<bool> {
    let filter = env_filter(config)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level = %config.level, "logging initialized");
    }
    Ok(installed)
}
