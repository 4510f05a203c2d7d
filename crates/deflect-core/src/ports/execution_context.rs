//! ExecutionContext port - where a submitted computation runs.
//!
//! The blocking adapter only needs to hand one future over and be told when it
//! is finished, so the port is a single fire-and-forget `submit`.

use std::sync::Arc;

use futures::future::BoxFuture;

/// Runs submitted futures to completion, possibly on another thread.
///
/// # Contract
/// - every submitted future is either polled to completion or dropped
/// - implementations are shared between concurrent calls (`Send + Sync`)
pub trait ExecutionContext: Send + Sync {
    fn submit(&self, task: BoxFuture<'static, ()>);
}

impl<T: ExecutionContext + ?Sized> ExecutionContext for Arc<T> {
    fn submit(&self, task: BoxFuture<'static, ()>) {
        (**self).submit(task)
    }
}

impl<T: ExecutionContext + ?Sized> ExecutionContext for &T {
    fn submit(&self, task: BoxFuture<'static, ()>) {
        (**self).submit(task)
    }
}
