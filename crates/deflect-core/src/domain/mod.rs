//! Domain model: failures, outcomes, log levels, ids.
//!
//! Everything here is a transient, call-scoped value. Nothing is persisted or
//! shared between calls.

pub mod failure;
pub mod ids;
pub mod level;
pub mod outcome;

pub use failure::{BoxError, Failure, Fatal, FatalPolicy};
pub use ids::{Id, IdMarker, Invocation, InvocationId};
pub use level::Level;
pub use outcome::{DomainResult, HandlerResult, Outcome, OutcomeKind};
