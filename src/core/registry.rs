//! # Bounded registry: named units run under a parallelism limit.
//!
//! Callers register named units (handler, optional post handler, arguments),
//! then start a run. Each queued unit gets its own execution context; a
//! per-run semaphore bounds how many execute at once.
//!
//! ## Architecture
//! ```text
//! submit(name, handler, post, args) ──► units[name] = (unit, Queued)
//!
//! run(max_parallel)
//!   └─► driver (JoinSet)
//!         ├─► context(a): Scheduled ─► permit ─► Running ─► run_unit ─► results[a], Done
//!         ├─► context(b): ...
//!         └─► all joined ─► RunHandle resolves with the result map
//!
//! remaining ──► watch channel ──► wait()
//! ```
//!
//! ## Rules
//! - Names are unique; rejected submissions never enter the registry.
//! - Status transitions are monotonic and happen only inside the unit's context.
//! - `results` gains exactly one entry per completed unit; `remaining` never underflows.
//! - One run at a time: `run` and `reset` return [`RegistryError::Busy`] while one is in flight.
//! - Nothing spins: waiting happens on the semaphore, the `watch` channel or the one-shot handle.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{RwLock, Semaphore, oneshot, watch};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::builder::RegistryBuilder;
use crate::core::runner::run_unit;
use crate::core::status::{Status, UnitState};
use crate::error::RegistryError;
use crate::events::{Bus, Event, EventKind};
use crate::invoke::{self, Handler, Value};

/// Aggregate result map: unit name → produced values.
pub type Results = HashMap<String, Vec<Value>>;

/// Immutable part of a registered unit.
struct Unit {
    handler: Handler,
    post: Option<Handler>,
    args: Vec<Value>,
}

struct Entry {
    unit: Arc<Unit>,
    status: Status,
}

#[derive(Default)]
struct State {
    units: HashMap<String, Entry>,
    total: usize,
    remaining: usize,
    running: usize,
    results: Results,
    run_in_flight: bool,
}

/// Registry of named units with bounded-parallel execution.
pub struct Registry {
    cfg: Config,
    state: RwLock<State>,
    remaining_tx: watch::Sender<usize>,
    bus: Bus,
}

/// One-shot handle resolving to the result map once the run's batch completes.
///
/// The batch is the set of units queued when `run` was called. Units submitted
/// while the run is in flight stay `Queued` for the next `run`, and the handle
/// does not wait for them.
#[must_use = "the handle is the only way to observe the run's result map"]
pub struct RunHandle {
    rx: oneshot::Receiver<Results>,
}

impl RunHandle {
    /// Waits for every unit of the run and returns all results recorded so far.
    ///
    /// # Errors
    /// [`RegistryError::RunAborted`] if the run driver went away (runtime shutdown).
    pub async fn results(self) -> Result<Results, RegistryError> {
        self.rx.await.map_err(|_| RegistryError::RunAborted)
    }
}

impl Registry {
    /// Creates a registry without subscribers.
    pub fn new(cfg: Config) -> Arc<Self> {
        RegistryBuilder::new(cfg).build()
    }

    /// Returns a builder for attaching subscribers.
    pub fn builder(cfg: Config) -> RegistryBuilder {
        RegistryBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, bus: Bus) -> Arc<Self> {
        let (remaining_tx, _rx) = watch::channel(0usize);
        Arc::new(Self {
            cfg,
            state: RwLock::new(State::default()),
            remaining_tx,
            bus,
        })
    }

    /// Configuration this registry was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event bus the registry publishes on.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Registers a unit in `Queued` state.
    ///
    /// `handler` must be callable and `args` must match its parameters. A
    /// non-callable `post` is ignored.
    ///
    /// # Errors
    /// - [`RegistryError::DuplicateName`] if `name` is already registered
    /// - [`RegistryError::Invoke`] if the handler is not callable or `args` do not fit
    pub async fn submit(
        &self,
        name: impl Into<String>,
        handler: impl Into<Value>,
        post: Option<Value>,
        args: Vec<Value>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let handler = invoke::prepare(handler.into(), &args)?;
        let post = post.and_then(|p| match p.into_handler() {
            Ok(h) => Some(h),
            Err(kind) => {
                debug!(unit = %name, %kind, "post handler is not callable; ignoring it");
                None
            }
        });

        {
            let mut st = self.state.write().await;
            if st.units.contains_key(&name) {
                return Err(RegistryError::DuplicateName { name });
            }
            st.units.insert(
                name.clone(),
                Entry {
                    unit: Arc::new(Unit {
                        handler,
                        post,
                        args,
                    }),
                    status: Status::default(),
                },
            );
            st.total += 1;
            st.remaining += 1;
            self.remaining_tx.send_replace(st.remaining);
        }

        self.bus
            .publish(Event::new(EventKind::UnitQueued).with_task(name));
        Ok(())
    }

    /// Starts every `Queued` unit with at most `max_parallel` executing at once.
    ///
    /// `max_parallel < 1` uses [`Config::default_max_parallel`].
    ///
    /// # Errors
    /// - [`RegistryError::Empty`] if no unit is queued
    /// - [`RegistryError::Busy`] if a previous run is still in flight
    pub async fn run(self: &Arc<Self>, max_parallel: usize) -> Result<RunHandle, RegistryError> {
        let requested = self.cfg.max_parallel_or_default(max_parallel);

        let batch: Vec<(String, Arc<Unit>)> = {
            let mut st = self.state.write().await;
            if st.run_in_flight {
                return Err(RegistryError::Busy);
            }
            let mut batch: Vec<(String, Arc<Unit>)> = st
                .units
                .iter()
                .filter(|(_, e)| e.status.state == UnitState::Queued)
                .map(|(name, e)| (name.clone(), Arc::clone(&e.unit)))
                .collect();
            if batch.is_empty() {
                return Err(RegistryError::Empty);
            }
            batch.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            st.run_in_flight = true;
            batch
        };
        let limit = requested.min(batch.len()).min(Semaphore::MAX_PERMITS);

        debug!(units = batch.len(), max_parallel = limit, "run starting");

        let sem = Arc::new(Semaphore::new(limit));
        let (tx, rx) = oneshot::channel();
        let me = Arc::clone(self);

        tokio::spawn(async move {
            let mut set = JoinSet::new();
            for (name, unit) in batch {
                set.spawn(Arc::clone(&me).execute(name, unit, Arc::clone(&sem)));
            }
            while let Some(res) = set.join_next().await {
                if let Err(e) = res {
                    warn!(error = %e, "unit context ended abnormally");
                }
            }

            let results = {
                let mut st = me.state.write().await;
                st.run_in_flight = false;
                st.results.clone()
            };
            debug!(results = results.len(), "run finished");
            let _ = tx.send(results);
        });

        Ok(RunHandle { rx })
    }

    /// Execution context of one unit.
    async fn execute(self: Arc<Self>, name: String, unit: Arc<Unit>, sem: Arc<Semaphore>) {
        self.advance(&name, UnitState::Scheduled).await;
        self.bus
            .publish(Event::new(EventKind::UnitScheduled).with_task(name.as_str()));

        let Ok(_permit) = sem.acquire_owned().await else {
            warn!(unit = %name, "run semaphore closed before admission");
            return;
        };

        {
            let mut st = self.state.write().await;
            if let Some(e) = st.units.get_mut(&name) {
                e.status.advance(UnitState::Running);
            }
            st.running += 1;
        }
        self.bus
            .publish(Event::new(EventKind::UnitStarting).with_task(name.as_str()));

        let out = run_unit(
            &name,
            &unit.handler,
            unit.post.as_ref(),
            unit.args.clone(),
            &self.bus,
        )
        .await;

        {
            let mut st = self.state.write().await;
            st.results.entry(name.clone()).or_insert(out);
            if let Some(e) = st.units.get_mut(&name) {
                e.status.advance(UnitState::Done);
            }
            st.running = st.running.saturating_sub(1);
            st.remaining = st.remaining.saturating_sub(1);
            self.remaining_tx.send_replace(st.remaining);
        }
        self.bus
            .publish(Event::new(EventKind::UnitFinished).with_task(name));
    }

    async fn advance(&self, name: &str, next: UnitState) {
        let mut st = self.state.write().await;
        if let Some(e) = st.units.get_mut(name) {
            e.status.advance(next);
        }
    }

    /// Suspends until no registered unit is left to complete.
    ///
    /// Logs `done/total` at debug level on every completion.
    pub async fn wait(&self) {
        let mut rx = self.remaining_tx.subscribe();
        loop {
            let left = *rx.borrow_and_update();
            if left == 0 {
                break;
            }
            let total = self.total().await;
            debug!(done = total.saturating_sub(left), total, "waiting for units");
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Status of one unit.
    pub async fn status(&self, name: &str) -> Option<Status> {
        self.state.read().await.units.get(name).map(|e| e.status)
    }

    /// Status of every unit, ordered by name.
    pub async fn statuses(&self) -> BTreeMap<String, Status> {
        self.state
            .read()
            .await
            .units
            .iter()
            .map(|(name, e)| (name.clone(), e.status))
            .collect()
    }

    /// `name, label, begin, end` for every unit, ordered by name.
    pub async fn status_lines(&self) -> Vec<String> {
        self.statuses()
            .await
            .iter()
            .map(|(name, st)| st.line(name))
            .collect()
    }

    /// Emits [`status_lines`](Self::status_lines) at debug level.
    pub async fn log_status(&self) {
        for line in self.status_lines().await {
            debug!(target: "taskgate::status", "{line}");
        }
    }

    /// Number of units ever registered since the last reset.
    pub async fn total(&self) -> usize {
        self.state.read().await.total
    }

    /// Number of registered units without a recorded result.
    pub async fn remaining(&self) -> usize {
        self.state.read().await.remaining
    }

    /// Number of units currently executing.
    pub async fn running(&self) -> usize {
        self.state.read().await.running
    }

    /// Copy of all results recorded so far.
    pub async fn results(&self) -> Results {
        self.state.read().await.results.clone()
    }

    /// Result of one unit, once it completed.
    pub async fn result(&self, name: &str) -> Option<Vec<Value>> {
        self.state.read().await.results.get(name).cloned()
    }

    /// Clears units, counters and results.
    ///
    /// # Errors
    /// [`RegistryError::Busy`] while a run is in flight.
    pub async fn reset(&self) -> Result<(), RegistryError> {
        let mut st = self.state.write().await;
        if st.run_in_flight {
            return Err(RegistryError::Busy);
        }
        *st = State::default();
        self.remaining_tx.send_replace(0);
        Ok(())
    }
}
