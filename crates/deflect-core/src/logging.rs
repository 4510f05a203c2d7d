//! Process-wide `tracing` subscriber setup.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::error::ConfigError;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install a fmt subscriber filtered by `config.filter`.
///
/// Only the first call does anything. A subscriber installed by someone else
/// (a host, a test harness) is left in place.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    if LOGGER_INITIALIZED.get().is_some() {
        return Ok(());
    }
    let filter = build_filter(config)?;

    LOGGER_INITIALIZED.get_or_init(|| {
        let layer = if config.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("global tracing subscriber already set, keeping it");
        }
        tracing::debug!(filter = %config.filter, json = config.json, "logging initialized");
    });
    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    Ok(EnvFilter::try_new(&config.filter)?)
}
