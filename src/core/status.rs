//! # Unit lifecycle status.
//!
//! ```text
//! Queued ──► Scheduled ──► Running ──► Done
//! ```
//!
//! Transitions only move forward; `started_at` is stamped on entering
//! `Running`, `finished_at` on entering `Done`.

use std::fmt;

use chrono::{DateTime, Local};

/// Lifecycle state of a registered unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitState {
    /// Accepted, not yet picked up by a run.
    Queued,
    /// Has an execution context, waits for a permit.
    Scheduled,
    /// Holds a permit and executes.
    Running,
    /// Result recorded.
    Done,
}

impl UnitState {
    /// Label used in status lines.
    pub fn as_label(&self) -> &'static str {
        match self {
            UnitState::Queued => "queue",
            UnitState::Scheduled => "scheduled",
            UnitState::Running => "doing",
            UnitState::Done => "done",
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// State plus wall-clock timestamps of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub state: UnitState,
    pub started_at: Option<DateTime<Local>>,
    pub finished_at: Option<DateTime<Local>>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            state: UnitState::Queued,
            started_at: None,
            finished_at: None,
        }
    }
}

impl Status {
    /// Moves to `next` if it is later in the lifecycle; returns whether it moved.
    pub(crate) fn advance(&mut self, next: UnitState) -> bool {
        if next <= self.state {
            return false;
        }
        self.state = next;
        match next {
            UnitState::Running => self.started_at = Some(Local::now()),
            UnitState::Done => self.finished_at = Some(Local::now()),
            UnitState::Queued | UnitState::Scheduled => {}
        }
        true
    }

    /// Renders `name, label, begin, end`; unset timestamps render as `0`.
    pub fn line(&self, name: &str) -> String {
        format!(
            "{name}, {}, {}, {}",
            self.state.as_label(),
            render(self.started_at),
            render(self.finished_at)
        )
    }
}

fn render(at: Option<DateTime<Local>>) -> String {
    match at {
        Some(t) => format!(
            "{}.{:04}",
            t.format("%Y-%m-%d %H:%M:%S"),
            t.timestamp_subsec_micros() / 100
        ),
        None => "0".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_monotonic() {
        let mut st = Status::default();
        assert!(st.advance(UnitState::Running));
        assert!(st.started_at.is_some());
        assert!(!st.advance(UnitState::Scheduled));
        assert_eq!(st.state, UnitState::Running);
        assert!(st.advance(UnitState::Done));
        assert!(st.finished_at >= st.started_at);
    }

    #[test]
    fn queued_line_renders_zero_timestamps() {
        assert_eq!(Status::default().line("a"), "a, queue, 0, 0");
    }

    #[test]
    fn done_line_has_four_fraction_digits() {
        let mut st = Status::default();
        st.advance(UnitState::Running);
        st.advance(UnitState::Done);
        let line = st.line("b");
        let parts: Vec<&str> = line.split(", ").collect();
        assert_eq!(parts[1], "done");
        let frac = parts[2].rsplit('.').next().unwrap();
        assert_eq!(frac.len(), 4);
        assert_eq!(parts[2].len(), "2006-01-02 15:04:05.0000".len());
    }
}
