//! Blocking adapter - run [`handle`] on an execution context and park until it is done.
//!
//! # Mechanics
//! - the dispatcher future is submitted once, wrapped so it always reports back
//! - the caller parks on a `OneShotLatch` (`Mutex` + `Condvar`), never spins
//! - a `Completer` dropped before reporting releases the latch as abandoned
//!
//! Panics that escape the dispatcher (fatal payloads, a panicking
//! handler-failure handler) are carried back and resumed on the caller thread.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use futures::FutureExt;

use super::dispatcher::handle;
use super::handlers::Handlers;
use crate::domain::{DomainResult, Failure};
use crate::ports::ExecutionContext;

/// How a submitted computation ended.
enum Completion<T> {
    Done(T),
    Panicked(Box<dyn Any + Send>),
    Abandoned,
}

/// Single-use latch; the first release wins and later ones are ignored.
struct OneShotLatch<T> {
    state: Mutex<Option<Completion<T>>>,
    released: Condvar,
}

impl<T> OneShotLatch<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(None),
            released: Condvar::new(),
        }
    }

    fn release(&self, completion: Completion<T>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.is_none() {
            *state = Some(completion);
        }
        self.released.notify_all();
    }

    /// Park until released. Spurious wake-ups go back to sleep.
    fn wait(&self) -> Completion<T> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(completion) = state.take() {
                return completion;
            }
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Owned by the submitted task. Releases the latch exactly once.
struct Completer<T> {
    latch: Arc<OneShotLatch<T>>,
    completed: bool,
}

impl<T> Completer<T> {
    fn new(latch: Arc<OneShotLatch<T>>) -> Self {
        Self {
            latch,
            completed: false,
        }
    }

    fn complete(mut self, completion: Completion<T>) {
        self.latch.release(completion);
        self.completed = true;
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if !self.completed {
            self.latch.release(Completion::Abandoned);
        }
    }
}

/// Synchronous form of [`handle`] for callers that cannot `.await`.
///
/// Returns exactly what `handle` would have returned on the same inputs. When
/// the context drops the computation before it finishes, returns
/// `Err(Failure::Abandoned)`.
///
/// # Panics
/// Resumes, on the calling thread, any panic that escaped the dispatcher.
///
/// Must not be called from a thread the context needs to make progress (for
/// example a worker of a single-threaded runtime passed in as `ctx`): the
/// caller parks and the computation would never run.
pub fn handle_blocking<C, A, E, B, F, Fut>(
    ctx: &C,
    domain_logic: F,
    handlers: Handlers<A, E, B>,
) -> Result<B, Failure>
where
    C: ExecutionContext + ?Sized,
    A: Send + 'static,
    E: Send + 'static,
    B: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = DomainResult<A, E>> + Send + 'static,
{
    let latch = Arc::new(OneShotLatch::new());
    let completer = Completer::new(Arc::clone(&latch));

    let task = async move {
        let completion = match AssertUnwindSafe(handle(domain_logic, handlers))
            .catch_unwind()
            .await
        {
            Ok(result) => Completion::Done(result),
            Err(payload) => Completion::Panicked(payload),
        };
        completer.complete(completion);
    };
    ctx.submit(task.boxed());

    match latch.wait() {
        Completion::Done(result) => result,
        Completion::Panicked(payload) => panic::resume_unwind(payload),
        Completion::Abandoned => Err(Failure::Abandoned),
    }
}
