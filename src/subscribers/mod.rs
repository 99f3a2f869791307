//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and built-in implementations for runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   unit / chain context ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                      │
//!                                                        ┌─────────────┼──────────┐
//!                                                        ▼             ▼          ▼
//!                                                    LogWriter  ProgressReporter  Custom
//! ```
//!
//! Subscribers are attached through `Registry::builder` / `Executor::builder`;
//! without subscribers no listener task is spawned.

mod log;
mod progress;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use progress::{Progress, ProgressReporter};
pub use set::SubscriberSet;
pub(crate) use set::spawn_listener;
pub use subscriber::Subscribe;
