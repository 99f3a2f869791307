//! # Gated executor: fire-and-forget units and pipelines under one capacity gate.
//!
//! ```text
//! fire_and_forget(name?, handler, post, args)
//!   ├─► prepare (callable + argument shape)   ── Err ──► ExecutorError::Invoke
//!   ├─► name? or NameSource::generate()       ── Err ──► ExecutorError::Naming
//!   ├─► gate.acquire(1, token)                ── Err ──► ExecutorError::Gate
//!   └─► spawn { run_unit(..); drop(permit); pending -= 1 }
//!
//! init(task_name?) ──► Chain (builder from pool, Weak<Shared>)
//!
//! join() / when_all_complete() ──► pending == 0 (watch channel)
//! ```
//!
//! ## Rules
//! - Submission errors are returned before anything is admitted.
//! - Every admitted unit or pipeline holds weight 1 until it finishes, panics included.
//! - `shutdown()` fails pending and future gate waits; admitted work runs to completion.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;
use crate::core::builder::ExecutorBuilder;
use crate::core::gate::WeightedGate;
use crate::core::runner::run_unit;
use crate::error::ExecutorError;
use crate::events::{Bus, Event, EventKind};
use crate::invoke::{self, Value};
use crate::naming::NameSource;
use crate::pipeline::{BuilderPool, Chain};

/// State shared by the executor, its spawned units and its chains.
pub(crate) struct Shared {
    pub(crate) cfg: Config,
    pub(crate) gate: WeightedGate,
    pub(crate) pool: BuilderPool,
    pub(crate) bus: Bus,
    pub(crate) names: Arc<dyn NameSource>,
    pub(crate) token: CancellationToken,
    pending: Arc<watch::Sender<usize>>,
}

/// Decrements the pending count when the admitted work ends.
pub(crate) struct PendingGuard {
    pending: Arc<watch::Sender<usize>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl Shared {
    pub(crate) fn new(
        gate: WeightedGate,
        pool: BuilderPool,
        bus: Bus,
        names: Arc<dyn NameSource>,
        token: CancellationToken,
        cfg: Config,
    ) -> Self {
        let (tx, _rx) = watch::channel(0usize);
        Self {
            cfg,
            gate,
            pool,
            bus,
            names,
            token,
            pending: Arc::new(tx),
        }
    }

    /// Counts one more admitted unit until the guard drops.
    pub(crate) fn track(&self) -> PendingGuard {
        self.pending.send_modify(|n| *n += 1);
        PendingGuard {
            pending: Arc::clone(&self.pending),
        }
    }
}

/// Runs units and pipelines under a shared weighted gate.
///
/// Cloning is cheap; clones share the gate, pool and bus.
#[derive(Clone)]
pub struct Executor {
    shared: Arc<Shared>,
}

impl Executor {
    /// Creates an executor without subscribers, using [`UuidNames`](crate::UuidNames).
    pub fn new(cfg: Config) -> Self {
        ExecutorBuilder::new(cfg).build()
    }

    /// Returns a builder for attaching subscribers or a custom name source.
    pub fn builder(cfg: Config) -> ExecutorBuilder {
        ExecutorBuilder::new(cfg)
    }

    pub(crate) fn from_shared(shared: Shared) -> Self {
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Configuration this executor was built with.
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// Event bus the executor and its chains publish on.
    pub fn bus(&self) -> &Bus {
        &self.shared.bus
    }

    /// The admission gate.
    pub fn gate(&self) -> &WeightedGate {
        &self.shared.gate
    }

    /// Admitted units and pipelines that have not finished yet.
    pub fn pending(&self) -> usize {
        *self.shared.pending.borrow()
    }

    /// Idle builders held by the pipeline pool.
    pub fn idle_builders(&self) -> usize {
        self.shared.pool.idle()
    }

    /// Validates, names and admits one unit, then runs it in the background.
    ///
    /// Waits for a gate slot; returns the unit's name once it is admitted.
    ///
    /// # Errors
    /// - [`ExecutorError::Invoke`] if the handler is not callable or `args` do not fit
    /// - [`ExecutorError::Naming`] if no name was given and generation failed
    /// - [`ExecutorError::Gate`] if the executor was shut down while waiting
    pub async fn fire_and_forget(
        &self,
        name: Option<&str>,
        handler: impl Into<Value>,
        post: Option<Value>,
        args: Vec<Value>,
    ) -> Result<String, ExecutorError> {
        let handler = invoke::prepare(handler.into(), &args)?;
        let name = match name {
            Some(n) => n.to_owned(),
            None => self.shared.names.generate()?,
        };
        let post = post.and_then(|p| match p.into_handler() {
            Ok(h) => Some(h),
            Err(kind) => {
                debug!(unit = %name, %kind, "post handler is not callable; ignoring it");
                None
            }
        });

        let permit = self.shared.gate.acquire(1, &self.shared.token).await?;
        let guard = self.shared.track();
        let bus = self.shared.bus.clone();
        let unit = name.clone();

        tokio::spawn(async move {
            bus.publish(Event::new(EventKind::UnitStarting).with_task(unit.as_str()));
            let out = run_unit(&unit, &handler, post.as_ref(), args, &bus).await;
            debug!(unit = %unit, outputs = out.len(), "unit finished");
            bus.publish(Event::new(EventKind::UnitFinished).with_task(unit));
            drop(permit);
            drop(guard);
        });

        Ok(name)
    }

    /// Suspends until every admitted unit and pipeline has finished.
    ///
    /// Returns immediately when nothing is pending; may be called repeatedly.
    pub async fn join(&self) {
        let mut rx = self.shared.pending.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Returns a one-shot that fires once all admitted work has finished.
    pub fn when_all_complete(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.shared.pending.subscribe();
        tokio::spawn(async move {
            let _ = pending.wait_for(|n| *n == 0).await;
            let _ = tx.send(());
        });
        rx
    }

    /// Fails pending and future gate waits; admitted work keeps running.
    pub fn shutdown(&self) {
        self.shared.token.cancel();
    }

    /// True once [`shutdown`](Self::shutdown) was called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// Starts a pipeline with a builder checked out of the pool.
    ///
    /// Without `task_name`, a name is generated on the first `append`.
    pub fn init(&self, task_name: Option<&str>) -> Chain {
        Chain::new(
            self.shared.pool.checkout(),
            Arc::downgrade(&self.shared),
            task_name,
        )
    }
}
