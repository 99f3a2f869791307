//! # Runtime events emitted by the registry, the executor and pipelines.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Unit events**: lifecycle of a registered or fire-and-forget unit
//! - **Gate events**: admission notices from the weighted gate
//! - **Chain events**: pipeline execution flow (started, stage failed, finished)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, unit
//! or pipeline name, failure reasons and stage positions.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use taskgate::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::StageFailed)
//!     .with_task("ingest")
//!     .with_stage(1)
//!     .with_reason("argument 0: expected int, got str");
//!
//! assert_eq!(ev.kind, EventKind::StageFailed);
//! assert_eq!(ev.task.as_deref(), Some("ingest"));
//! assert_eq!(ev.stage, Some(1));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Unit events ===
    /// Unit accepted by the registry.
    ///
    /// Sets:
    /// - `task`: unit name
    UnitQueued,

    /// Unit got an execution context and waits for a permit.
    ///
    /// Sets:
    /// - `task`: unit name
    UnitScheduled,

    /// Unit holds its permit and is about to run.
    ///
    /// Sets:
    /// - `task`: unit name
    UnitStarting,

    /// Unit completed; its result (possibly empty) has been recorded.
    ///
    /// Sets:
    /// - `task`: unit name
    UnitFinished,

    /// Handler could not be invoked or panicked; the unit records an empty result.
    ///
    /// Sets:
    /// - `task`: unit name
    /// - `reason`: failure message
    UnitFailed,

    /// Post handler failed; the unit's own result is unaffected.
    ///
    /// Sets:
    /// - `task`: unit name
    /// - `reason`: failure message
    PostFailed,

    // === Gate events ===
    /// A pipeline found the gate full and is waiting for a slot.
    ///
    /// Sets:
    /// - `task`: pipeline name
    GateWaiting,

    // === Chain events ===
    /// Pipeline holds its gate slot and starts its first stage.
    ///
    /// Sets:
    /// - `task`: pipeline name
    ChainStarted,

    /// A stage failed; later stages are skipped.
    ///
    /// Sets:
    /// - `task`: pipeline name
    /// - `stage`: zero-based stage index
    /// - `reason`: failure message
    StageFailed,

    /// Pipeline context finished (every stage ran, or one failed) and released its slot.
    ///
    /// Sets:
    /// - `task`: pipeline name
    ChainFinished,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::UnitQueued => "unit_queued",
            EventKind::UnitScheduled => "unit_scheduled",
            EventKind::UnitStarting => "unit_starting",
            EventKind::UnitFinished => "unit_finished",
            EventKind::UnitFailed => "unit_failed",
            EventKind::PostFailed => "post_failed",
            EventKind::GateWaiting => "gate_waiting",
            EventKind::ChainStarted => "chain_started",
            EventKind::StageFailed => "stage_failed",
            EventKind::ChainFinished => "chain_finished",
        }
    }

    /// True for kinds that report a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EventKind::UnitFailed | EventKind::PostFailed | EventKind::StageFailed
        )
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Unit or pipeline name, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, panic messages).
    pub reason: Option<Arc<str>>,
    /// Zero-based pipeline stage index.
    pub stage: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            stage: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a unit or pipeline name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a stage index (saturates at `u32::MAX`).
    #[inline]
    pub fn with_stage(mut self, stage: usize) -> Self {
        self.stage = Some(u32::try_from(stage).unwrap_or(u32::MAX));
        self
    }
}
