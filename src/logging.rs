//! Logging initialisation
//!
//! Wires a `tracing-subscriber` registry from an explicit [`LogConfig`].
//! `RUST_LOG` takes precedence over the configured level when set.

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Install the global tracing subscriber.
///
/// Fails if a subscriber is already installed; callers embedding this crate
/// into a larger host may skip it and configure tracing themselves.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.try_init(),
    };

    result.map_err(|e| Error::Other(format!("failed to initialise logging: {}", e)))
}
