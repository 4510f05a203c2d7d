//! LogSink implementations that never fail: `TracingSink` and `NoopSink`.

use async_trait::async_trait;
use tracing::{debug, error, info, trace, warn};

use crate::domain::{Failure, Level};
use crate::ports::LogSink;

/// Forwards messages to `tracing` at the matching level.
///
/// `name` is recorded as the `sink` field so several sinks can share one
/// subscriber.
#[derive(Debug, Clone)]
pub struct TracingSink {
    name: String,
}

impl TracingSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new("deflect")
    }
}

#[async_trait]
impl LogSink for TracingSink {
    async fn log(&self, level: Level, message: &str) -> Result<(), Failure> {
        let sink = self.name.as_str();
        match level {
            Level::Trace => trace!(sink, "{message}"),
            Level::Debug => debug!(sink, "{message}"),
            Level::Info => info!(sink, "{message}"),
            Level::Warn => warn!(sink, "{message}"),
            Level::Error => error!(sink, "{message}"),
        }
        Ok(())
    }
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn log(&self, _level: Level, _message: &str) -> Result<(), Failure> {
        Ok(())
    }
}
