//! Timer adapter - default handlers for scheduled, fire-and-forget triggers.
//!
//! A timer run has nobody to answer, so every handler produces `()` and the
//! defaults only log: success at info, domain error at warn, system failure
//! at error.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::{Handlers, handle, handle_blocking};
use crate::domain::{DomainResult, Failure, Level};
use crate::ports::{ExecutionContext, LogSink, log_failure};

pub const SUCCESS_MESSAGE: &str = "Timer run completed.";

/// Trigger details as the host serialises them.
///
/// ```json
/// {"Schedule":{"AdjustForDST":true},
///  "ScheduleStatus":{"Last":"2024-05-01T10:15:00+00:00","Next":"2024-05-01T10:20:00+00:00","LastUpdated":"2024-05-01T10:15:00+00:00"},
///  "IsPastDue":false}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimerInfo {
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub schedule_status: Option<ScheduleStatus>,
    #[serde(default)]
    pub is_past_due: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "AdjustForDST", default)]
    pub adjust_for_dst: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScheduleStatus {
    pub last: DateTime<Utc>,
    pub next: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl TimerInfo {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// When the next run is due, if the host reported a schedule status.
    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.schedule_status.as_ref().map(|status| status.next)
    }
}

/// Builds the default [`Handlers`] for a timer trigger.
#[derive(Clone)]
pub struct TimerHandlers {
    info: Arc<TimerInfo>,
    sink: Arc<dyn LogSink>,
}

impl TimerHandlers {
    pub fn new(info: TimerInfo, sink: Arc<dyn LogSink>) -> Self {
        Self {
            info: Arc::new(info),
            sink,
        }
    }

    pub fn build<A, E>(self) -> Handlers<A, E, ()>
    where
        A: Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let (on_success, on_domain_error, on_system_failure) =
            (Arc::clone(&self.sink), Arc::clone(&self.sink), Arc::clone(&self.sink));
        let info = Arc::clone(&self.info);

        Handlers::new(
            move |_a: A| {
                let sink = Arc::clone(&on_success);
                let info = Arc::clone(&info);
                async move {
                    let message = match info.next_run() {
                        Some(next) => format!("{SUCCESS_MESSAGE} Next run at {}.", next.to_rfc3339()),
                        None => SUCCESS_MESSAGE.to_string(),
                    };
                    sink.log(Level::Info, &message).await
                }
            },
            move |e: E| {
                let sink = Arc::clone(&on_domain_error);
                let message = format!("Timer run rejected: {e}");
                async move { sink.log(Level::Warn, &message).await }
            },
            move |failure: Failure| {
                let sink = Arc::clone(&on_system_failure);
                async move { log_failure(sink.as_ref(), &failure).await }
            },
        )
        .log_unrecoverable_to(self.sink)
    }
}

impl fmt::Debug for TimerHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandlers")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

pub async fn handle_timer<A, E, F, Fut>(
    info: &TimerInfo,
    domain_logic: F,
    handlers: Handlers<A, E, ()>,
) -> Result<(), Failure>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<A, E>>,
{
    if info.is_past_due {
        debug!("timer trigger is past due");
    }
    handle(domain_logic, handlers).await
}

pub fn handle_timer_blocking<C, A, E, F, Fut>(
    ctx: &C,
    info: &TimerInfo,
    domain_logic: F,
    handlers: Handlers<A, E, ()>,
) -> Result<(), Failure>
where
    C: ExecutionContext + ?Sized,
    A: Send + 'static,
    E: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = DomainResult<A, E>> + Send + 'static,
{
    if info.is_past_due {
        debug!("timer trigger is past due");
    }
    handle_blocking(ctx, domain_logic, handlers)
}
