//! # LogWriter: events as tracing records
//!
//! Forwards every [`Event`] to `tracing`. Failures are logged at `warn`,
//! gate waits at `info`, everything else at `debug`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG taskgate::subscribers::log: unit_starting task="a"
//!  WARN taskgate::subscribers::log: stage_failed task="ingest" stage=1 reason="argument 0: expected int, got str"
//!  INFO taskgate::subscribers::log: gate_waiting task="ingest"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let label = e.kind.as_label();
        let task = e.task.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::UnitFailed | EventKind::PostFailed => {
                warn!(task, reason = e.reason.as_deref(), "{label}");
            }
            EventKind::StageFailed => {
                warn!(task, stage = e.stage, reason = e.reason.as_deref(), "{label}");
            }
            EventKind::GateWaiting => {
                info!(task, "{label}");
            }
            _ => {
                debug!(task, seq = e.seq, "{label}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
