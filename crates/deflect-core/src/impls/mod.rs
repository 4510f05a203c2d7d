//! Impls - implementations of the ports.
//!
//! # Execution contexts
//! - **RuntimeContext**: a tokio runtime (the caller's, or the shared computation pool)
//! - **InlineContext**: runs on the submitting thread
//!
//! # Log sinks
//! - **TracingSink** / **NoopSink**
//! - **MemorySink**: records entries for assertions

pub mod inline_context;
pub mod memory_sink;
pub mod runtime_context;
pub mod tracing_sink;

pub use self::inline_context::InlineContext;
pub use self::memory_sink::{LogEntry, MemorySink};
pub use self::runtime_context::RuntimeContext;
pub use self::tracing_sink::{NoopSink, TracingSink};
