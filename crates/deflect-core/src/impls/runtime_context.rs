//! RuntimeContext - submit computations to a tokio runtime.
//!
//! # Two ways to get one
//! - [`RuntimeContext::current`]: the runtime the caller is already inside
//! - [`RuntimeContext::computation_pool`]: a process-wide multi-thread runtime
//!   built on first use and never shut down
//!
//! # Blocking callers
//! `handle_blocking` parks its caller. Calling it from a worker of the same
//! runtime takes that worker out of service for the duration of the call, and
//! on a single worker it never returns. Non-async hosts are the intended callers.

use std::sync::OnceLock;

use futures::future::BoxFuture;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

use crate::config::PoolConfig;
use crate::error::ConfigError;
use crate::ports::ExecutionContext;

static COMPUTATION_POOL: OnceLock<Runtime> = OnceLock::new();

/// Spawns each submitted computation as a detached tokio task.
///
/// If the runtime shuts down before the task finishes, the task is dropped and
/// the blocking caller sees `Failure::Abandoned`.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    handle: Handle,
}

impl RuntimeContext {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// The runtime the calling thread belongs to.
    pub fn current() -> Result<Self, ConfigError> {
        Ok(Self::new(Handle::try_current()?))
    }

    /// The shared computation pool, sized from the environment on first use.
    pub fn computation_pool() -> Result<Self, ConfigError> {
        if let Some(runtime) = COMPUTATION_POOL.get() {
            return Ok(Self::new(runtime.handle().clone()));
        }
        Self::computation_pool_with(&PoolConfig::from_env()?)
    }

    /// The shared computation pool. `config` is only used by the call that builds it.
    pub fn computation_pool_with(config: &PoolConfig) -> Result<Self, ConfigError> {
        if let Some(runtime) = COMPUTATION_POOL.get() {
            return Ok(Self::new(runtime.handle().clone()));
        }
        let built = build_pool(config)?;
        // Losing a race drops `built`; every caller ends up on the same pool.
        let runtime = COMPUTATION_POOL.get_or_init(|| built);
        Ok(Self::new(runtime.handle().clone()))
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

fn build_pool(config: &PoolConfig) -> Result<Runtime, ConfigError> {
    let mut builder = Builder::new_multi_thread();
    if let Some(threads) = config.worker_threads {
        builder.worker_threads(threads);
    }
    let runtime = builder
        .thread_name(config.thread_name.clone())
        .enable_all()
        .build()?;
    debug!(
        worker_threads = ?config.worker_threads,
        thread_name = %config.thread_name,
        "computation pool started"
    );
    Ok(runtime)
}

impl ExecutionContext for RuntimeContext {
    fn submit(&self, task: BoxFuture<'static, ()>) {
        drop(self.handle.spawn(task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc;

    #[test]
    fn current_fails_outside_a_runtime() {
        assert!(matches!(RuntimeContext::current(), Err(ConfigError::NoRuntime(_))));
    }

    #[tokio::test]
    async fn current_finds_the_enclosing_runtime() {
        let ctx = RuntimeContext::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        ctx.submit(Box::pin(async move {
            let _ = tx.send(42);
        }));
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[test]
    fn computation_pool_is_shared() {
        let config = PoolConfig {
            worker_threads: Some(2),
            thread_name: "deflect-test-pool".to_string(),
        };
        assert!(RuntimeContext::computation_pool_with(&config).is_ok());
        assert!(COMPUTATION_POOL.get().is_some());
        assert!(RuntimeContext::computation_pool().is_ok());
    }

    #[test]
    fn submitted_tasks_run_on_pool_threads() {
        let ctx = Arc::new(RuntimeContext::computation_pool().unwrap());
        let (tx, rx) = mpsc::channel();
        ctx.submit(Box::pin(async move {
            let _ = tx.send(std::thread::current().id());
        }));
        let worker = rx.recv().unwrap();
        assert_ne!(worker, std::thread::current().id());
    }
}
