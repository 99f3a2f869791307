//! # Runtime event bus.
//!
//! Registry units, executor units and pipeline contexts all publish into one
//! [`Bus`]. The registry or executor that owns the bus runs at most one
//! listener, which hands every event to its [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! unit / chain contexts ──publish──► Bus (broadcast ring) ──► spawn_listener ──► SubscriberSet
//! ```
//!
//! Publishing never waits. The ring is shared by all receivers; a receiver
//! that falls behind skips the oldest events, and events sent while nobody
//! listens are gone.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone; every clone publishes into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus whose ring holds `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Sends `ev` to current receivers; dropped when there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receivers(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_see_events_after_subscribing() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::UnitQueued));

        let mut rx = bus.subscribe();
        assert_eq!(bus.receivers(), 1);
        bus.publish(Event::new(EventKind::UnitFinished).with_task("a"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::UnitFinished);
        assert_eq!(ev.task.as_deref(), Some("a"));
    }
}
