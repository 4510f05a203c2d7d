//! MemorySink - a recording sink for tests and local runs.
//!
//! Entries are kept in a `Mutex<Vec<_>>` in arrival order. A sink built with
//! [`MemorySink::failing`] records nothing and reports every write as failed,
//! which is how tests reach the "logging is down" paths.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::{Failure, Level};
use crate::ports::LogSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
    fail_writes: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every write fails.
    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail_writes: true,
        }
    }

    /// Snapshot of everything logged so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn log(&self, level: Level, message: &str) -> Result<(), Failure> {
        if self.fail_writes {
            return Err(Failure::msg("log sink is unavailable"));
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                level,
                message: message.to_string(),
            });
        Ok(())
    }
}
