//! InlineContext - run the computation right away on the submitting thread.

use futures::future::BoxFuture;

use crate::ports::ExecutionContext;

/// Drives each task to completion inside `submit` with `futures::executor::block_on`.
///
/// No tokio runtime is entered, so computations that need tokio timers or IO
/// belong on a [`RuntimeContext`](super::RuntimeContext) instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineContext;

impl ExecutionContext for InlineContext {
    fn submit(&self, task: BoxFuture<'static, ()>) {
        futures::executor::block_on(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn task_has_finished_when_submit_returns() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        InlineContext.submit(Box::pin(async move {
            flag.store(true, Ordering::SeqCst);
        }));
        assert!(ran.load(Ordering::SeqCst));
    }
}
