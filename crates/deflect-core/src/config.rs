//! Process configuration read from the environment.
//!
//! | variable                 | field                       | default        |
//! |--------------------------|-----------------------------|----------------|
//! | `DEFLECT_WORKER_THREADS` | `PoolConfig::worker_threads`| tokio default  |
//! | `DEFLECT_THREAD_NAME`    | `PoolConfig::thread_name`   | `deflect-pool` |
//! | `DEFLECT_LOG`            | `LoggingConfig::filter`     | `info`         |
//! | `DEFLECT_LOG_FORMAT`     | `LoggingConfig::json`       | `pretty`       |

use serde::Deserialize;

use crate::error::ConfigError;

pub const WORKER_THREADS_VAR: &str = "DEFLECT_WORKER_THREADS";
pub const THREAD_NAME_VAR: &str = "DEFLECT_THREAD_NAME";
pub const LOG_FILTER_VAR: &str = "DEFLECT_LOG";
pub const LOG_FORMAT_VAR: &str = "DEFLECT_LOG_FORMAT";

/// Sizing of the process-wide computation pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// `None` lets tokio pick (one worker per core).
    pub worker_threads: Option<usize>,
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "deflect-pool".to_string(),
        }
    }
}

impl PoolConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the settings through `lookup`; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(WORKER_THREADS_VAR) {
            let threads: usize = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(WORKER_THREADS_VAR, raw.as_str(), e))?;
            if threads == 0 {
                return Err(ConfigError::invalid(WORKER_THREADS_VAR, raw, "must be at least 1"));
            }
            config.worker_threads = Some(threads);
        }
        if let Some(name) = lookup(THREAD_NAME_VAR).filter(|name| !name.trim().is_empty()) {
            config.thread_name = name;
        }
        Ok(config)
    }
}

/// Settings for [`init_logging`](crate::logging::init_logging).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `info,deflect_core=debug`.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_FILTER_VAR).filter(|f| !f.trim().is_empty()) {
            config.filter = filter;
        }
        if let Some(format) = lookup(LOG_FORMAT_VAR) {
            config.json = match format.trim().to_ascii_lowercase().as_str() {
                "json" => true,
                "pretty" | "text" | "" => false,
                _ => {
                    return Err(ConfigError::invalid(
                        LOG_FORMAT_VAR,
                        format,
                        "expected \"json\" or \"pretty\"",
                    ));
                }
            };
        }
        Ok(config)
    }
}
