//! Outcome model: the classified result of one run of domain logic.
//!
//! Domain logic reports expected errors as values (`Ok(Err(e))`) and unexpected
//! ones through the outer `Result` (`Err(failure)`), so classification is a
//! plain match with no hidden control flow.

use serde::{Deserialize, Serialize};

use super::failure::Failure;

/// What domain logic returns: a success or a typed domain error, or a [`Failure`].
pub type DomainResult<A, E> = Result<Result<A, E>, Failure>;

/// What a handler returns. `Ok` is *handled*, `Err` is *handler failed*.
pub type HandlerResult<B> = Result<B, Failure>;

/// Label of an [`Outcome`], used for logging and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    DomainError,
    SystemFailure,
}

/// Exactly one of the three branches a run of domain logic can end in.
#[derive(Debug)]
pub enum Outcome<A, E> {
    Success(A),
    DomainError(E),
    SystemFailure(Failure),
}

impl<A, E> Outcome<A, E> {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success(_) => OutcomeKind::Success,
            Self::DomainError(_) => OutcomeKind::DomainError,
            Self::SystemFailure(_) => OutcomeKind::SystemFailure,
        }
    }
}

impl<A, E> From<DomainResult<A, E>> for Outcome<A, E> {
    fn from(result: DomainResult<A, E>) -> Self {
        match result {
            Ok(Ok(a)) => Self::Success(a),
            Ok(Err(e)) => Self::DomainError(e),
            Err(failure) => Self::SystemFailure(failure),
        }
    }
}
