//! Dispatcher - classify the outcome of domain logic and run exactly one handler.
//!
//! # Flow
//! 1. run domain logic, classify into success / domain error / system failure
//! 2. run the matching primary handler through [`handle_safely`]
//! 3. if it failed, run the handler-failure handler once (unwrapped)
//! 4. a handled value is the only success exit
//! 5. otherwise run the unrecoverable-state callback and return the last failure
//!
//! Fatal panics skip all of this and keep unwinding.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{Instrument, debug, error, info_span, warn};

use super::handlers::Handlers;
use super::safe::{catch_outcome, handle_safely};
use crate::domain::{DomainResult, Failure, Outcome};

/// Run `domain_logic` and convert whatever it produces into `B`.
///
/// Returns `Ok(b)` when a handler produced a value. Returns `Err(failure)` only
/// after every handling attempt failed and the unrecoverable-state callback has
/// run. Fatal panics from the domain logic or a primary handler, and any panic
/// from the handler-failure handler, propagate out of this function.
///
/// # Example
/// ```ignore
/// let greeting = handle(
///     || async { Ok(Ok::<_, MyError>("world".to_string())) },
///     handlers,
/// )
/// .await?;
/// ```
pub async fn handle<A, E, B, F, Fut>(domain_logic: F, handlers: Handlers<A, E, B>) -> Result<B, Failure>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<A, E>>,
{
    let invocation_id = handlers.ids.generate_invocation_id();
    let span = info_span!("handle", invocation_id = %invocation_id);
    dispatch(domain_logic, handlers).instrument(span).await
}

async fn dispatch<A, E, B, F, Fut>(domain_logic: F, handlers: Handlers<A, E, B>) -> Result<B, Failure>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<A, E>>,
{
    let policy = handlers.fatal_policy;

    let outcome = catch_outcome(policy, domain_logic).await;
    debug!(outcome = ?outcome.kind(), "domain logic finished");

    let handled = match outcome {
        Outcome::Success(a) => handle_safely(policy, || (handlers.on_success)(a)).await,
        Outcome::DomainError(e) => handle_safely(policy, || (handlers.on_domain_error)(e)).await,
        Outcome::SystemFailure(failure) => {
            handle_safely(policy, || (handlers.on_system_failure)(failure)).await
        }
    };

    let failure = match handled {
        Ok(b) => return Ok(b),
        Err(failure) => failure,
    };
    warn!(error = %failure, kind = failure.kind(), "handler failed, retrying with handler-failure handler");

    let last = match (handlers.on_handler_failure)(failure).await {
        Ok(b) => return Ok(b),
        Err(last) => last,
    };
    error!(error = %last, kind = last.kind(), "no handler produced a result");

    let unrecoverable = AssertUnwindSafe(async { (handlers.on_unrecoverable)(&last).await })
        .catch_unwind()
        .await;
    match unrecoverable {
        Ok(Ok(())) => {}
        Ok(Err(ignored)) => warn!(error = %ignored, "unrecoverable-state callback failed"),
        Err(payload) => {
            let ignored = policy.contain(payload);
            warn!(error = %ignored, "unrecoverable-state callback panicked");
        }
    }

    Err(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fatal, FatalPolicy, HandlerResult, Level};
    use crate::impls::MemorySink;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how often each callback ran.
    #[derive(Default)]
    struct Calls {
        success: AtomicUsize,
        domain_error: AtomicUsize,
        system_failure: AtomicUsize,
        handler_failure: AtomicUsize,
        unrecoverable: AtomicUsize,
    }

    impl Calls {
        fn get(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }

        fn primary(&self) -> usize {
            Self::get(&self.success) + Self::get(&self.domain_error) + Self::get(&self.system_failure)
        }
    }

    /// Which handlers fail (by returning `Err`) in a scenario.
    #[derive(Clone, Copy, Default)]
    struct Failing {
        primary: bool,
        handler_failure: bool,
    }

    fn counting_handlers(calls: Arc<Calls>, failing: Failing) -> Handlers<u8, String, String> {
        let (c1, c2, c3, c4, c5) = (
            Arc::clone(&calls),
            Arc::clone(&calls),
            Arc::clone(&calls),
            Arc::clone(&calls),
            Arc::clone(&calls),
        );
        let reply = move |label: String| -> HandlerResult<String> {
            if failing.primary {
                Err(Failure::msg(format!("{label} handler failed")))
            } else {
                Ok(label)
            }
        };
        Handlers::new(
            move |a: u8| {
                c1.success.fetch_add(1, Ordering::SeqCst);
                let result = reply(format!("success {a}"));
                async move { result }
            },
            move |e: String| {
                c2.domain_error.fetch_add(1, Ordering::SeqCst);
                let result = reply(format!("domain error {e}"));
                async move { result }
            },
            move |f: Failure| {
                c3.system_failure.fetch_add(1, Ordering::SeqCst);
                let result = reply(format!("system failure {f}"));
                async move { result }
            },
        )
        .with_handler_failure(move |f: Failure| {
            c4.handler_failure.fetch_add(1, Ordering::SeqCst);
            let result = if failing.handler_failure {
                Err(Failure::msg(format!("handler-failure handler failed after: {f}")))
            } else {
                Ok(format!("recovered from {f}"))
            };
            async move { result }
        })
        .with_unrecoverable(move |_failure| {
            c5.unrecoverable.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }.boxed()
        })
    }

    async fn succeed() -> DomainResult<u8, String> {
        Ok(Ok(1))
    }

    async fn reject() -> DomainResult<u8, String> {
        Ok(Err("nope".to_string()))
    }

    async fn fail() -> DomainResult<u8, String> {
        Err(Failure::msg("x"))
    }

    async fn explode() -> DomainResult<u8, String> {
        panic!("domain logic blew up")
    }

    async fn interrupted() -> DomainResult<u8, String> {
        std::panic::panic_any(Fatal::Interrupted)
    }

    async fn success_handler_that_panics(_a: u8) -> HandlerResult<String> {
        panic!("success handler blew up")
    }

    async fn handler_failure_that_panics(_f: Failure) -> HandlerResult<String> {
        panic!("last line of defence fell")
    }

    #[tokio::test]
    async fn success_runs_only_the_success_handler() {
        let calls = Arc::new(Calls::default());
        let result = handle(succeed, counting_handlers(Arc::clone(&calls), Failing::default())).await;

        assert_eq!(result.unwrap(), "success 1");
        assert_eq!(Calls::get(&calls.success), 1);
        assert_eq!(calls.primary(), 1);
        assert_eq!(Calls::get(&calls.handler_failure), 0);
        assert_eq!(Calls::get(&calls.unrecoverable), 0);
    }

    #[tokio::test]
    async fn domain_error_runs_only_the_domain_error_handler() {
        let calls = Arc::new(Calls::default());
        let result = handle(reject, counting_handlers(Arc::clone(&calls), Failing::default())).await;

        assert_eq!(result.unwrap(), "domain error nope");
        assert_eq!(Calls::get(&calls.domain_error), 1);
        assert_eq!(calls.primary(), 1);
    }

    #[tokio::test]
    async fn returned_failure_runs_only_the_system_failure_handler() {
        let calls = Arc::new(Calls::default());
        let result = handle(fail, counting_handlers(Arc::clone(&calls), Failing::default())).await;

        assert_eq!(result.unwrap(), "system failure x");
        assert_eq!(Calls::get(&calls.system_failure), 1);
        assert_eq!(calls.primary(), 1);
    }

    #[tokio::test]
    async fn panicking_domain_logic_is_a_system_failure() {
        let calls = Arc::new(Calls::default());
        let result = handle(explode, counting_handlers(Arc::clone(&calls), Failing::default())).await;

        assert_eq!(result.unwrap(), "system failure panicked: domain logic blew up");
        assert_eq!(Calls::get(&calls.system_failure), 1);
    }

    #[tokio::test]
    async fn failed_primary_handler_is_retried_once_with_handler_failure_handler() {
        let calls = Arc::new(Calls::default());
        let failing = Failing {
            primary: true,
            handler_failure: false,
        };
        let result = handle(succeed, counting_handlers(Arc::clone(&calls), failing)).await;

        assert_eq!(result.unwrap(), "recovered from success 1 handler failed");
        assert_eq!(calls.primary(), 1);
        assert_eq!(Calls::get(&calls.handler_failure), 1);
        assert_eq!(Calls::get(&calls.unrecoverable), 0);
    }

    #[tokio::test]
    async fn total_failure_runs_unrecoverable_once_and_returns_the_last_failure() {
        let calls = Arc::new(Calls::default());
        let failing = Failing {
            primary: true,
            handler_failure: true,
        };
        let result = handle(reject, counting_handlers(Arc::clone(&calls), failing)).await;

        let failure = result.unwrap_err();
        assert_eq!(
            failure.to_string(),
            "handler-failure handler failed after: domain error nope handler failed"
        );
        assert_eq!(calls.primary(), 1);
        assert_eq!(Calls::get(&calls.handler_failure), 1);
        assert_eq!(Calls::get(&calls.unrecoverable), 1);
    }

    #[tokio::test]
    async fn panicking_primary_handler_is_contained() {
        let handlers: Handlers<u8, String, String> = Handlers::new(
            success_handler_that_panics,
            |e: String| async move { Ok(e) },
            |f: Failure| async move { Ok(format!("system failure {f}")) },
        );
        let result = handle(succeed, handlers).await;
        assert_eq!(result.unwrap(), "system failure panicked: success handler blew up");
    }

    #[tokio::test]
    async fn fatal_panic_bypasses_every_handler() {
        let calls = Arc::new(Calls::default());
        let handlers = counting_handlers(Arc::clone(&calls), Failing::default());

        let caught = AssertUnwindSafe(handle(interrupted, handlers)).catch_unwind().await;

        let payload = caught.unwrap_err();
        assert_eq!(payload.downcast_ref::<Fatal>(), Some(&Fatal::Interrupted));
        assert_eq!(calls.primary(), 0);
        assert_eq!(Calls::get(&calls.handler_failure), 0);
        assert_eq!(Calls::get(&calls.unrecoverable), 0);
    }

    #[tokio::test]
    async fn custom_policy_can_classify_fatal_payloads() {
        let calls = Arc::new(Calls::default());
        let handlers = counting_handlers(Arc::clone(&calls), Failing::default())
            .with_fatal_policy(FatalPolicy::never());

        let result = handle(interrupted, handlers).await;
        assert_eq!(result.unwrap(), "system failure panicked: unknown panic");
    }

    #[tokio::test]
    async fn panicking_handler_failure_handler_propagates_raw() {
        let calls = Arc::new(Calls::default());
        let handlers = counting_handlers(Arc::clone(&calls), Failing {
            primary: true,
            handler_failure: false,
        })
        .with_handler_failure(handler_failure_that_panics);

        let caught = AssertUnwindSafe(handle(succeed, handlers)).catch_unwind().await;

        assert!(caught.is_err());
        assert_eq!(Calls::get(&calls.unrecoverable), 0);
    }

    #[tokio::test]
    async fn unrecoverable_callback_outcome_does_not_change_the_result() {
        let handlers: Handlers<u8, String, String> = Handlers::new(
            |_a: u8| async { Err(Failure::msg("first")) },
            |e: String| async move { Ok(e) },
            |_f: Failure| async { Err(Failure::msg("second")) },
        )
        .with_unrecoverable(|_failure| async { Err(Failure::msg("logging is down")) }.boxed());

        let result = handle(succeed, handlers).await;
        assert_eq!(result.unwrap_err().to_string(), "second");
    }

    #[tokio::test]
    async fn panicking_unrecoverable_callback_is_contained() {
        fn explode_on_log(_failure: &Failure) -> futures::future::BoxFuture<'_, Result<(), Failure>> {
            panic!("logger blew up")
        }
        let handlers: Handlers<u8, String, String> = Handlers::new(
            |_a: u8| async { Err(Failure::msg("first")) },
            |e: String| async move { Ok(e) },
            |_f: Failure| async { Err(Failure::msg("second")) },
        )
        .with_unrecoverable(explode_on_log);

        let result = handle(succeed, handlers).await;
        assert_eq!(result.unwrap_err().to_string(), "second");
    }

    #[tokio::test]
    async fn unrecoverable_failure_is_logged_to_the_sink() {
        let sink = Arc::new(MemorySink::new());
        let handlers: Handlers<u8, String, String> = Handlers::new(
            |_a: u8| async { Err(Failure::msg("first")) },
            |e: String| async move { Ok(e) },
            |_f: Failure| async { Err(Failure::msg("second")) },
        )
        .log_unrecoverable_to(sink.clone());

        let _ = handle(succeed, handlers).await;

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::Error);
        assert_eq!(
            entries[0].message,
            "An exception was thrown. The exception is: second"
        );
    }

    #[tokio::test]
    async fn default_handler_failure_is_the_system_failure_handler() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let handlers: Handlers<u8, String, String> = Handlers::new(
            |_a: u8| async { Err(Failure::msg("success handler failed")) },
            |e: String| async move { Ok(e) },
            move |f: Failure| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(format!("system failure {f}")) }
            },
        );

        let result = handle(succeed, handlers).await;

        assert_eq!(result.unwrap(), "system failure success handler failed");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Generated {
            Success(u8),
            DomainError(String),
            Failure(String),
            Panic(String),
        }

        fn generated() -> impl Strategy<Value = Generated> {
            prop_oneof![
                any::<u8>().prop_map(Generated::Success),
                "[a-z]{0,12}".prop_map(Generated::DomainError),
                "[a-z]{1,12}".prop_map(Generated::Failure),
                "[a-z]{1,12}".prop_map(Generated::Panic),
            ]
        }

        async fn run(generated: Generated) -> DomainResult<u8, String> {
            match generated {
                Generated::Success(a) => Ok(Ok(a)),
                Generated::DomainError(e) => Ok(Err(e)),
                Generated::Failure(m) => Err(Failure::msg(m)),
                Generated::Panic(m) => panic!("{m}"),
            }
        }

        fn constant_handlers(calls: Arc<Calls>, reply: String) -> Handlers<u8, String, String> {
            let (c1, c2, c3) = (Arc::clone(&calls), Arc::clone(&calls), Arc::clone(&calls));
            let (r1, r2, r3) = (reply.clone(), reply.clone(), reply);
            Handlers::new(
                move |_a: u8| {
                    c1.success.fetch_add(1, Ordering::SeqCst);
                    let r = r1.clone();
                    async move { Ok(r) }
                },
                move |_e: String| {
                    c2.domain_error.fetch_add(1, Ordering::SeqCst);
                    let r = r2.clone();
                    async move { Ok(r) }
                },
                move |_f: Failure| {
                    c3.system_failure.fetch_add(1, Ordering::SeqCst);
                    let r = r3.clone();
                    async move { Ok(r) }
                },
            )
        }

        proptest! {
            #[test]
            fn non_failing_handlers_always_yield_a_result(
                outcome in generated(),
                reply in "[a-z]{0,16}",
            ) {
                let calls = Arc::new(Calls::default());
                let handlers = constant_handlers(Arc::clone(&calls), reply.clone());

                let result = futures::executor::block_on(handle(move || run(outcome), handlers));

                prop_assert_eq!(result.unwrap(), reply);
                prop_assert_eq!(calls.primary(), 1);
            }

            #[test]
            fn both_handlers_failing_always_returns_the_last_failure(outcome in generated()) {
                let calls = Arc::new(Calls::default());
                let failing = Failing { primary: true, handler_failure: true };
                let handlers = counting_handlers(Arc::clone(&calls), failing);

                let result = futures::executor::block_on(handle(move || run(outcome), handlers));

                let failure = result.unwrap_err();
                prop_assert!(failure.to_string().starts_with("handler-failure handler failed"));
                prop_assert_eq!(calls.primary(), 1);
                prop_assert_eq!(Calls::get(&calls.handler_failure), 1);
                prop_assert_eq!(Calls::get(&calls.unrecoverable), 1);
            }
        }
    }
}
