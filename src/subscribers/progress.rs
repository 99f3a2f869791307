//! # ProgressReporter: drive a progress indicator from completions
//!
//! The engine does not render progress itself; it advances anything that
//! implements [`Progress`] once per finished unit or pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// A progress indicator that can be stepped forward.
pub trait Progress: Send + Sync + 'static {
    /// Advances the indicator by one completed item.
    fn advance(&self);
}

impl<F> Progress for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn advance(&self) {
        self()
    }
}

/// Subscriber that calls [`Progress::advance`] on `UnitFinished` and `ChainFinished`.
pub struct ProgressReporter {
    progress: Arc<dyn Progress>,
}

impl ProgressReporter {
    pub fn new(progress: Arc<dyn Progress>) -> Self {
        Self { progress }
    }
}

#[async_trait]
impl Subscribe for ProgressReporter {
    async fn on_event(&self, e: &Event) {
        if matches!(e.kind, EventKind::UnitFinished | EventKind::ChainFinished) {
            self.progress.advance();
        }
    }

    fn name(&self) -> &'static str {
        "progress"
    }
}
