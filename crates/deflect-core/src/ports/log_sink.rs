//! LogSink port - the logging collaborator handlers write to.

use async_trait::async_trait;

use crate::domain::{Failure, Level};

/// Prefix of every message written for an unexpected failure.
pub const THROWABLE_MESSAGE_PREFIX: &str = "An exception was thrown. The exception is:";

/// Accepts a severity and a message.
///
/// Implementations must not panic. A sink that cannot write reports it through
/// the returned `Result`; callers decide whether that matters.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn log(&self, level: Level, message: &str) -> Result<(), Failure>;
}

/// Write `failure` (with its causes) at [`Level::Error`].
pub async fn log_failure(sink: &dyn LogSink, failure: &Failure) -> Result<(), Failure> {
    let message = format!("{THROWABLE_MESSAGE_PREFIX} {}", failure.report());
    sink.log(Level::Error, &message).await
}
