//! Ports - the collaborators the pipeline talks to, as traits.
//!
//! Concrete implementations live in [`crate::impls`].

pub mod clock;
pub mod execution_context;
pub mod id_generator;
pub mod log_sink;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::execution_context::ExecutionContext;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::log_sink::{LogSink, THROWABLE_MESSAGE_PREFIX, log_failure};
