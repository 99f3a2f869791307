//! # Subscriber extension point.
//!
//! Implement [`Subscribe`] and pass it to
//! [`RegistryBuilder::with_subscribers`](crate::RegistryBuilder::with_subscribers)
//! or [`ExecutorBuilder::with_subscribers`](crate::ExecutorBuilder::with_subscribers)
//! to observe unit and pipeline lifecycle events.
//!
//! Every subscriber is driven by its own worker, fed from a bounded queue of
//! [`Subscribe::queue_capacity`] events. A full queue drops the event for that
//! subscriber alone, and a panic in `on_event` is logged with `tracing::warn!`
//! and the worker moves on to the next event.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use taskgate::{Event, EventKind, Subscribe};
//!
//! struct Failures;
//!
//! #[async_trait]
//! impl Subscribe for Failures {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind.is_failure() {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failures" }
//!     fn queue_capacity(&self) -> usize { 256 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives lifecycle events on a dedicated worker.
///
/// `on_event` should not block the runtime thread.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event, in the order the bus delivered it.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow and panic warnings.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue length for this subscriber; values below 1 are treated as 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
