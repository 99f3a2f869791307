//! Runtime core: admission, execution and lifecycle.
//!
//! Public entry points are [`Registry`] (bounded-parallel named units) and
//! [`Executor`] (fire-and-forget units and pipelines under a weighted gate).
//!
//! Internal modules:
//! - [`builder`]: registry/executor builders wiring the bus and subscribers;
//! - [`gate`]: weighted admission gate with RAII permits;
//! - [`status`]: unit lifecycle states and status lines;
//! - [`runner`]: runs one unit (handler, then count-matched post handler);
//! - [`registry`]: named units under a per-run semaphore;
//! - [`executor`]: shared gate, builder pool and pending-work tracking.

mod builder;
pub(crate) mod executor;
mod gate;
mod registry;
pub(crate) mod runner;
mod status;

pub use builder::{ExecutorBuilder, RegistryBuilder};
pub use executor::Executor;
pub use gate::{GatePermit, WeightedGate};
pub use registry::{Registry, Results, RunHandle};
pub use status::{Status, UnitState};
