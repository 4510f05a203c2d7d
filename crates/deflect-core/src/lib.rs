//! deflect-core
//!
//! Deterministic handling of effectful domain logic. A computation yields a
//! success, a domain error, or a system failure (a returned `Failure` or a
//! panic); exactly one handler turns that into the caller's result type, with
//! one fallback attempt and a final unrecoverable-state hook.
//!
//! # Modules
//! - **domain**: Failure, Fatal, FatalPolicy, Outcome, Level, ids
//! - **ports**: ExecutionContext, LogSink, Clock, IdGenerator
//! - **app**: `handle`, `handle_blocking`, `Handlers`, safe invocation
//! - **impls**: RuntimeContext, InlineContext, TracingSink, NoopSink, MemorySink
//! - **adapters**: HTTP and timer handler sets
//! - **config** / **logging**: environment configuration and subscriber setup

pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod logging;
pub mod ports;

pub use crate::app::{Handlers, handle, handle_blocking};
pub use crate::domain::{DomainResult, Failure, Fatal, FatalPolicy, HandlerResult, Outcome};
pub use crate::error::ConfigError;
