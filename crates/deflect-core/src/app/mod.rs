//! App - the outcome-handling pipeline.
//!
//! - **safe**: run one computation, turn non-fatal panics into values
//! - **handlers**: the callback set a caller supplies
//! - **dispatcher**: `handle`, the async entry point
//! - **blocking**: `handle_blocking`, the synchronous entry point

pub mod blocking;
pub mod dispatcher;
pub mod handlers;
pub mod safe;

pub use self::blocking::handle_blocking;
pub use self::dispatcher::handle;
pub use self::handlers::{HandlerFn, Handlers, UnrecoverableFn};
pub use self::safe::{catch_outcome, handle_safely};
