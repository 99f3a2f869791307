//! # taskgate
//!
//! **Taskgate** is an in-process concurrent task-execution engine for tokio.
//!
//! Work is expressed as dynamically typed units: a callable [`Handler`] with
//! declared parameter and return [`Kind`]s, plus a list of [`Value`]
//! arguments. Every call is checked against the declared signature, so
//! mis-shaped work is rejected when it is submitted, not when it runs.
//!
//! Two execution modes share the same invoker, runner and event bus:
//! - [`Registry`]: register named units, run them with bounded parallelism,
//!   collect one result per unit and inspect per-unit lifecycle status.
//! - [`Executor`]: fire-and-forget units and multi-stage pipelines admitted
//!   through a shared [`WeightedGate`]; pipeline builders are recycled
//!   through a [`BuilderPool`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   submit(name, handler, post, args)            fire_and_forget / init().append().execute()
//!                 │                                              │
//!                 ▼                                              ▼
//! ┌───────────────────────────────────┐      ┌───────────────────────────────────────┐
//! │  Registry                         │      │  Executor                             │
//! │  - units: name → (unit, Status)   │      │  - WeightedGate (capacity)            │
//! │  - results: name → Vec<Value>     │      │  - BuilderPool (reset before reuse)   │
//! │  - per-run Semaphore(max_parallel)│      │  - NameSource (generated names)       │
//! │  - remaining (watch channel)      │      │  - pending (watch channel)            │
//! └───────┬───────────────────────────┘      └───────┬───────────────────────────────┘
//!         ▼                                          ▼
//!   unit contexts ─► run_unit()              unit / chain contexts ─► run_unit() / stages
//!         │                                          │
//!         │ Publishes: UnitQueued, UnitScheduled,    │ Publishes: UnitStarting, UnitFinished,
//!         │ UnitStarting, UnitFinished, UnitFailed,  │ GateWaiting, ChainStarted, StageFailed,
//!         │ PostFailed                               │ ChainFinished, ...
//!         ▼                                          ▼
//! ┌───────────────────────────────────────────────────────────────────────────────────┐
//! │                           Bus (broadcast channel)                                 │
//! │                        (capacity: Config::bus_capacity)                           │
//! └──────────────────────────────────────┬────────────────────────────────────────────┘
//!                                        ▼
//!                                  SubscriberSet
//!                                 (per-sub queues)
//!                           ┌────────────┼─────────────┐
//!                           ▼            ▼             ▼
//!                       LogWriter  ProgressReporter  custom
//! ```
//!
//! ### Pipeline data flow
//! ```text
//! stage 0: handler0(bound0...)                       ──► out0
//! stage 1: handler1(out0..., bound1...)              ──► out1
//! stage i: handler_i(out_{i-1}..., bound_i...)       ──► out_i
//! ```
//! Shapes are validated on every `append`; the first failure freezes the
//! builder and `execute` returns it without running anything.
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Invocation**    | Checked dynamic calls over boxed values.                     | [`Handler`], [`Value`], [`Kind`], [`invoke()`] |
//! | **Registry**      | Named units, bounded parallelism, aggregate results, status. | [`Registry`], [`RunHandle`], [`Status`]    |
//! | **Executor**      | Fire-and-forget units and pipelines under one gate.          | [`Executor`], [`Chain`], [`WeightedGate`]  |
//! | **Subscriber API**| Hook into unit and chain lifecycle events.                   | [`Subscribe`], [`LogWriter`], [`ProgressReporter`] |
//! | **Errors**        | Typed errors with stable labels.                             | [`RegistryError`], [`ExecutorError`], [`PipelineError`] |
//! | **Configuration** | Explicit runtime settings.                                   | [`Config`]                                 |
//!
//! ## Example
//! ```rust
//! use taskgate::{Config, Handler, Registry, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reg = Registry::new(Config::default());
//!
//!     let greet = Handler::func(|who: String| format!("hello {who}"));
//!     reg.submit("a", greet.clone(), None, vec![Value::from("a")]).await?;
//!     reg.submit("b", greet, None, vec![Value::from("b")]).await?;
//!
//!     let results = reg.run(2).await?.results().await?;
//!     assert_eq!(results["a"], vec![Value::from("hello a")]);
//!     assert_eq!(results["b"], vec![Value::from("hello b")]);
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod invoke;
mod naming;
mod pipeline;
mod subscribers;

// ---- Public re-exports ----

pub use crate::config::Config;
pub use crate::core::{
    Executor, ExecutorBuilder, GatePermit, Registry, RegistryBuilder, Results, RunHandle, Status,
    UnitState, WeightedGate,
};
pub use error::{ExecutorError, GateError, InvokeError, NamingError, PipelineError, RegistryError};
pub use events::{Bus, Event, EventKind};
pub use invoke::{
    FromValue, Handler, HandlerFuture, IntoHandler, IntoValues, Kind, Opaque, Value, invoke,
    kinds_of,
};
pub use naming::{NameSource, UuidNames};
pub use pipeline::{BuilderPool, BuilderState, Chain, PipelineBuilder, Stage};
pub use subscribers::{LogWriter, Progress, ProgressReporter, Subscribe, SubscriberSet};
