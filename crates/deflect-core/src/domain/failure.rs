//! Failure model: what a computation "throws" instead of returning a value.
//!
//! Two kinds of unexpected failure reach the pipeline:
//! - an error value returned through the outer `Result` of a computation
//! - a panic raised while the computation (or a handler) was being polled
//!
//! Panics are split further by a [`FatalPolicy`]. Fatal panics are never turned
//! into a [`Failure`]; they keep unwinding past every handler.

use std::any::Any;
use std::fmt;
use std::panic;

/// Boxed error carried by [`Failure::Error`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An unexpected failure, either raised by domain logic or by a handler.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// The computation reported an error through its outer `Result`.
    #[error("{0}")]
    Error(#[source] BoxError),

    /// The computation panicked with a non-fatal payload.
    #[error("panicked: {message}")]
    Panic { message: String },

    /// The execution context dropped the computation before it produced a result.
    #[error("computation was dropped by its execution context before completion")]
    Abandoned,
}

impl Failure {
    /// Wrap any error (or anything convertible into a boxed error, such as a `&str`).
    pub fn from_error(error: impl Into<BoxError>) -> Self {
        Self::Error(error.into())
    }

    /// Shorthand for a failure that only carries a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Error(message.into().into())
    }

    /// Build a failure from a caught panic payload.
    ///
    /// `&str` and `String` payloads keep their message; anything else is reported
    /// as an unknown panic.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::Panic { message }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::Panic { .. } => "panic",
            Self::Abandoned => "abandoned",
        }
    }

    /// The failure followed by its chain of causes: `outer: inner: root`.
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        // `Error` displays its boxed error, so the chain starts one level down.
        let mut source = match self {
            Self::Error(inner) => inner.source(),
            _ => std::error::Error::source(self),
        };
        while let Some(cause) = source {
            report.push_str(": ");
            report.push_str(&cause.to_string());
            source = cause.source();
        }
        report
    }
}

/// Runtime-level conditions that must never be classified or handled.
///
/// Raise one with `std::panic::panic_any(Fatal::Interrupted)`; the default
/// [`FatalPolicy`] lets it unwind straight through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fatal {
    /// Memory or another process-wide resource is exhausted.
    ResourceExhausted,
    /// The thread running the computation is being torn down.
    ThreadTerminated,
    /// The computation was interrupted by its host.
    Interrupted,
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResourceExhausted => "resource exhausted",
            Self::ThreadTerminated => "thread terminated",
            Self::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

/// Decides which panic payloads are fatal.
#[derive(Clone, Copy)]
pub struct FatalPolicy {
    is_fatal: fn(&(dyn Any + Send)) -> bool,
}

impl FatalPolicy {
    pub const fn new(is_fatal: fn(&(dyn Any + Send)) -> bool) -> Self {
        Self { is_fatal }
    }

    /// Every panic is classified as an ordinary failure.
    pub const fn never() -> Self {
        Self::new(|_| false)
    }

    pub fn is_fatal(&self, payload: &(dyn Any + Send)) -> bool {
        (self.is_fatal)(payload)
    }

    /// Turn a caught panic into a [`Failure`], or resume unwinding if it is fatal.
    pub fn contain(&self, payload: Box<dyn Any + Send>) -> Failure {
        if self.is_fatal(payload.as_ref()) {
            panic::resume_unwind(payload);
        }
        Failure::from_panic(payload)
    }
}

impl Default for FatalPolicy {
    /// Only [`Fatal`] payloads are fatal.
    fn default() -> Self {
        Self::new(|payload| payload.is::<Fatal>())
    }
}

impl fmt::Debug for FatalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FatalPolicy").finish_non_exhaustive()
    }
}
