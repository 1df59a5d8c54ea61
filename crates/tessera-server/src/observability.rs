//! Tracing setup.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

/// Installs the global subscriber. `RUST_LOG` wins over the configured
/// level; an invalid directive falls back to `info`.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(logging: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(logging.ansi))
        .try_init()
        .is_ok()
}
