//! Handlers - the callbacks that turn an [`Outcome`](crate::domain::Outcome) into `B`.
//!
//! Handlers are stored type-erased behind `Arc`, so a `Handlers` value is cheap
//! to clone and `Send + Sync` whatever `A`, `E` and `B` are. That also gives the
//! handler-failure default its exact meaning: unless overridden it is the same
//! `Arc` as the system-failure handler, not a copy of it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::domain::{Failure, FatalPolicy, HandlerResult};
use crate::ports::{IdGenerator, LogSink, SystemClock, UlidGenerator, log_failure};

/// A type-erased handler from `T` to `HandlerResult<B>`.
pub type HandlerFn<T, B> = Arc<dyn Fn(T) -> BoxFuture<'static, HandlerResult<B>> + Send + Sync>;

/// A type-erased unrecoverable-state callback. Only its side effect matters.
pub type UnrecoverableFn =
    Arc<dyn for<'a> Fn(&'a Failure) -> BoxFuture<'a, Result<(), Failure>> + Send + Sync>;

/// The full handler set for one kind of domain logic.
///
/// # Example
/// ```ignore
/// let handlers = Handlers::new(
///     |name: String| async move { Ok(format!("hello {name}")) },
///     |e: MyError| async move { Ok(format!("rejected: {e}")) },
///     |f: Failure| async move { Ok(format!("failed: {f}")) },
/// )
/// .log_unrecoverable_to(sink);
/// ```
pub struct Handlers<A, E, B> {
    pub(crate) on_success: HandlerFn<A, B>,
    pub(crate) on_domain_error: HandlerFn<E, B>,
    pub(crate) on_system_failure: HandlerFn<Failure, B>,
    pub(crate) on_handler_failure: HandlerFn<Failure, B>,
    pub(crate) on_unrecoverable: UnrecoverableFn,
    pub(crate) fatal_policy: FatalPolicy,
    pub(crate) ids: Arc<dyn IdGenerator>,
}

fn erase<T, B, F, Fut>(handler: F) -> HandlerFn<T, B>
where
    T: 'static,
    B: 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<B>> + Send + 'static,
{
    Arc::new(move |t| handler(t).boxed())
}

fn ignore_unrecoverable(_: &Failure) -> BoxFuture<'_, Result<(), Failure>> {
    async { Ok(()) }.boxed()
}

impl<A, E, B> Handlers<A, E, B>
where
    A: 'static,
    E: 'static,
    B: 'static,
{
    /// Build a handler set from the three primary handlers.
    ///
    /// Defaults: the handler-failure handler is `on_system_failure` itself, the
    /// unrecoverable-state callback does nothing, only [`Fatal`](crate::domain::Fatal)
    /// panics are fatal, and invocation ids come from the system clock.
    pub fn new<S, SFut, D, DFut, F, FFut>(on_success: S, on_domain_error: D, on_system_failure: F) -> Self
    where
        S: Fn(A) -> SFut + Send + Sync + 'static,
        SFut: Future<Output = HandlerResult<B>> + Send + 'static,
        D: Fn(E) -> DFut + Send + Sync + 'static,
        DFut: Future<Output = HandlerResult<B>> + Send + 'static,
        F: Fn(Failure) -> FFut + Send + Sync + 'static,
        FFut: Future<Output = HandlerResult<B>> + Send + 'static,
    {
        let on_system_failure = erase(on_system_failure);
        Self {
            on_success: erase(on_success),
            on_domain_error: erase(on_domain_error),
            on_handler_failure: Arc::clone(&on_system_failure),
            on_system_failure,
            on_unrecoverable: Arc::new(ignore_unrecoverable),
            fatal_policy: FatalPolicy::default(),
            ids: Arc::new(UlidGenerator::new(SystemClock)),
        }
    }

    /// Replace the handler that gets a second chance when a primary handler fails.
    ///
    /// It runs without the safety wrapper: a panic inside it propagates raw.
    pub fn with_handler_failure<H, HFut>(mut self, on_handler_failure: H) -> Self
    where
        H: Fn(Failure) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = HandlerResult<B>> + Send + 'static,
    {
        self.on_handler_failure = erase(on_handler_failure);
        self
    }

    /// Replace the callback run once when every handling attempt failed.
    pub fn with_unrecoverable<U>(mut self, on_unrecoverable: U) -> Self
    where
        U: for<'a> Fn(&'a Failure) -> BoxFuture<'a, Result<(), Failure>> + Send + Sync + 'static,
    {
        self.on_unrecoverable = Arc::new(on_unrecoverable);
        self
    }

    /// Log the unrecoverable failure to `sink` at error level.
    pub fn log_unrecoverable_to(self, sink: Arc<dyn LogSink>) -> Self {
        self.with_unrecoverable(move |failure| {
            let sink = Arc::clone(&sink);
            async move { log_failure(sink.as_ref(), failure).await }.boxed()
        })
    }

    pub fn with_fatal_policy(mut self, fatal_policy: FatalPolicy) -> Self {
        self.fatal_policy = fatal_policy;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// True while the handler-failure handler is still the system-failure handler.
    pub fn handler_failure_is_system_failure(&self) -> bool {
        Arc::ptr_eq(&self.on_handler_failure, &self.on_system_failure)
    }
}

impl<A, E, B> Clone for Handlers<A, E, B> {
    fn clone(&self) -> Self {
        Self {
            on_success: Arc::clone(&self.on_success),
            on_domain_error: Arc::clone(&self.on_domain_error),
            on_system_failure: Arc::clone(&self.on_system_failure),
            on_handler_failure: Arc::clone(&self.on_handler_failure),
            on_unrecoverable: Arc::clone(&self.on_unrecoverable),
            fatal_policy: self.fatal_policy,
            ids: Arc::clone(&self.ids),
        }
    }
}

impl<A, E, B> fmt::Debug for Handlers<A, E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("fatal_policy", &self.fatal_policy)
            .field(
                "handler_failure_is_system_failure",
                &Arc::ptr_eq(&self.on_handler_failure, &self.on_system_failure),
            )
            .finish_non_exhaustive()
    }
}
