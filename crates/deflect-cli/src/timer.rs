//! The scheduled job: refuses to run when the trigger is past due.

use std::fmt;
use std::sync::Arc;

use deflect_core::adapters::timer::{TimerHandlers, TimerInfo, handle_timer_blocking};
use deflect_core::ports::{ExecutionContext, LogSink};
use deflect_core::{DomainResult, Failure};
use tracing::info;

pub const DEFAULT_TRIGGER: &str = r#"{"Schedule":{"AdjustForDST":true},"IsPastDue":false}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastDue;

impl fmt::Display for PastDue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("trigger is past due, skipping this run")
    }
}

pub async fn run_job(past_due: bool) -> DomainResult<(), PastDue> {
    if past_due {
        return Ok(Err(PastDue));
    }
    info!("scheduled job ran");
    Ok(Ok(()))
}

pub fn trigger<C>(ctx: &C, info: TimerInfo, sink: Arc<dyn LogSink>) -> Result<(), Failure>
where
    C: ExecutionContext + ?Sized,
{
    let past_due = info.is_past_due;
    let handlers = TimerHandlers::new(info.clone(), sink).build();
    handle_timer_blocking(ctx, &info, move || run_job(past_due), handlers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deflect_core::domain::Level;
    use deflect_core::impls::{InlineContext, MemorySink};

    #[test]
    fn default_trigger_runs_the_job() {
        let sink = Arc::new(MemorySink::new());
        let info = TimerInfo::parse(DEFAULT_TRIGGER).unwrap();

        trigger(&InlineContext, info, sink.clone()).unwrap();

        assert_eq!(sink.messages_at(Level::Info), vec!["Timer run completed.".to_string()]);
    }

    #[test]
    fn past_due_trigger_is_skipped_with_a_warning() {
        let sink = Arc::new(MemorySink::new());
        let info = TimerInfo::parse(r#"{"IsPastDue":true}"#).unwrap();

        trigger(&InlineContext, info, sink.clone()).unwrap();

        assert_eq!(
            sink.messages_at(Level::Warn),
            vec!["Timer run rejected: trigger is past due, skipping this run".to_string()]
        );
    }
}
