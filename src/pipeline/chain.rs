//! # Chain: a pipeline under construction, bound to its executor.
//!
//! ```text
//! executor.init(name?) ──► Chain { builder (from pool), Weak<Shared> }
//!   .append(h1, bound1) ──► validate, freeze on error
//!   .append(h2, bound2)
//!   .execute().await
//!      ├─► stored error / no stages ──► builder back to pool, Err
//!      ├─► gate slot (try first, then wait; GateWaiting event)
//!      └─► spawn {
//!            args(0) = bound1
//!            args(i) = outputs(i-1) ++ bound(i)
//!            first failure stops the chain (StageFailed)
//!            builder back to pool, slot released
//!          }
//! ```
//!
//! A chain dropped without `execute` returns its builder to the pool.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use futures::FutureExt;
use tracing::{debug, info, warn};

use super::builder::{BuilderState, PipelineBuilder, Stage};
use crate::core::executor::Shared;
use crate::core::runner::panic_message;
use crate::error::{GateError, PipelineError};
use crate::events::{Bus, Event, EventKind};
use crate::invoke::Value;

/// A pipeline being built; consumed by [`execute`](Chain::execute).
pub struct Chain {
    builder: Option<PipelineBuilder>,
    owner: Weak<Shared>,
}

impl Chain {
    pub(crate) fn new(
        mut builder: PipelineBuilder,
        owner: Weak<Shared>,
        task_name: Option<&str>,
    ) -> Self {
        if let Some(name) = task_name {
            builder.set_task_name(name);
        }
        Self {
            builder: Some(builder),
            owner,
        }
    }

    /// Appends a stage; a validation failure is stored and freezes the chain.
    ///
    /// The first append assigns a generated name when none was given.
    pub fn append(mut self, handler: impl Into<Value>, bound_args: Vec<Value>) -> Self {
        if let Some(builder) = self.builder.as_mut() {
            if builder.task_name().is_none() && builder.error().is_none() {
                match self.owner.upgrade() {
                    Some(shared) => match shared.names.generate() {
                        Ok(name) => builder.set_task_name(name),
                        Err(e) => builder.fail(e.into()),
                    },
                    None => builder.fail(PipelineError::ExecutorGone),
                }
            }
            if let Err(e) = builder.append(handler.into(), bound_args) {
                debug!(pipeline = ?builder.task_name(), error = %e, "append rejected");
            }
        }
        self
    }

    pub fn state(&self) -> BuilderState {
        self.builder
            .as_ref()
            .map_or(BuilderState::Empty, PipelineBuilder::state)
    }

    pub fn name(&self) -> Option<&str> {
        self.builder.as_ref().and_then(PipelineBuilder::task_name)
    }

    /// The stored validation error, if an append failed.
    pub fn error(&self) -> Option<&PipelineError> {
        self.builder.as_ref().and_then(PipelineBuilder::error)
    }

    /// Admits the pipeline through the gate and runs its stages in the background.
    ///
    /// Returns once the pipeline is admitted; stage failures are published as
    /// `StageFailed` events, not returned.
    ///
    /// # Errors
    /// - the stored validation error, without running anything (even if the executor is gone)
    /// - [`PipelineError::EmptyChain`] if no stage was appended
    /// - [`PipelineError::ExecutorGone`] if the executor was dropped
    /// - [`PipelineError::Gate`] if the executor was shut down, before or while waiting
    pub async fn execute(mut self) -> Result<(), PipelineError> {
        let Some(builder) = self.builder.take() else {
            return Err(PipelineError::EmptyChain);
        };
        let stored = builder.error().cloned();
        let Some(shared) = self.owner.upgrade() else {
            return Err(stored.unwrap_or(PipelineError::ExecutorGone));
        };

        if let Some(err) = stored {
            shared.pool.checkin(builder);
            return Err(err);
        }
        if builder.stages().is_empty() {
            shared.pool.checkin(builder);
            return Err(PipelineError::EmptyChain);
        }
        if shared.token.is_cancelled() {
            shared.pool.checkin(builder);
            return Err(GateError::Cancelled.into());
        }
        let name: Arc<str> = match builder.task_name() {
            Some(n) => Arc::from(n),
            None => match shared.names.generate() {
                Ok(n) => Arc::from(n),
                Err(e) => {
                    shared.pool.checkin(builder);
                    return Err(e.into());
                }
            },
        };

        let permit = match shared.gate.try_acquire(1) {
            Some(permit) => permit,
            None => {
                if shared.cfg.verbose {
                    info!(pipeline = %name, "blocking to acquire gate slot");
                }
                shared
                    .bus
                    .publish(Event::new(EventKind::GateWaiting).with_task(Arc::clone(&name)));
                match shared.gate.acquire(1, &shared.token).await {
                    Ok(permit) => permit,
                    Err(e) => {
                        shared.pool.checkin(builder);
                        return Err(e.into());
                    }
                }
            }
        };
        let guard = shared.track();

        tokio::spawn(async move {
            shared
                .bus
                .publish(Event::new(EventKind::ChainStarted).with_task(Arc::clone(&name)));
            run_stages(&name, builder.stages(), &shared.bus).await;
            shared
                .bus
                .publish(Event::new(EventKind::ChainFinished).with_task(Arc::clone(&name)));

            shared.pool.checkin(builder);
            drop(permit);
            drop(guard);
        });

        Ok(())
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        if let (Some(builder), Some(shared)) = (self.builder.take(), self.owner.upgrade()) {
            shared.pool.checkin(builder);
        }
    }
}

/// Runs `stages` in order; stops at the first failure.
async fn run_stages(name: &Arc<str>, stages: &[Stage], bus: &Bus) {
    let mut carried: Vec<Value> = Vec::new();

    for (index, stage) in stages.iter().enumerate() {
        let mut args = std::mem::take(&mut carried);
        args.extend(stage.bound_args().iter().cloned());

        let reason = match AssertUnwindSafe(stage.handler().invoke(args))
            .catch_unwind()
            .await
        {
            Ok(Ok(out)) => {
                carried = out;
                continue;
            }
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(&*panic),
        };

        warn!(pipeline = %name, stage = index, %reason, "stage failed; skipping the rest of the chain");
        bus.publish(
            Event::new(EventKind::StageFailed)
                .with_task(Arc::clone(name))
                .with_stage(index)
                .with_reason(reason),
        );
        return;
    }
}
