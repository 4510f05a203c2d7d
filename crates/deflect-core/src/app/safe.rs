//! Safe invocation: run a computation and turn a panic into a classified value.
//!
//! Both helpers call the closure *inside* the caught future, so a panic raised
//! while building the future is caught the same way as one raised while
//! polling it.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::domain::{DomainResult, FatalPolicy, HandlerResult, Outcome};

/// Run a handler, converting a non-fatal panic into `Err(Failure::Panic)`.
///
/// An `Err` returned by the handler passes through unchanged. Fatal panics keep
/// unwinding.
pub async fn handle_safely<B, F, Fut>(policy: FatalPolicy, handler: F) -> HandlerResult<B>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = HandlerResult<B>>,
{
    match AssertUnwindSafe(async move { handler().await })
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(payload) => Err(policy.contain(payload)),
    }
}

/// Run domain logic and classify what it produced.
///
/// A returned `Err(failure)` and a non-fatal panic both become
/// [`Outcome::SystemFailure`]. Fatal panics keep unwinding.
pub async fn catch_outcome<A, E, F, Fut>(policy: FatalPolicy, domain_logic: F) -> Outcome<A, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<A, E>>,
{
    match AssertUnwindSafe(async move { domain_logic().await })
        .catch_unwind()
        .await
    {
        Ok(result) => Outcome::from(result),
        Err(payload) => Outcome::SystemFailure(policy.contain(payload)),
    }
}
