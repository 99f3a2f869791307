//! Lifecycle events for units and pipelines.
//!
//! [`Event`] carries a global sequence number, a timestamp, an [`EventKind`]
//! and optional task name, reason and stage index. [`Bus`] broadcasts them to
//! the owner's subscriber listener.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
