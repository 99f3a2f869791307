//! # Runtime configuration.
//!
//! Provides [`Config`], the settings shared by the [`Registry`](crate::Registry)
//! and the [`Executor`](crate::Executor). Configuration is passed explicitly into
//! constructors and builders; nothing is looked up globally.
//!
//! ## Sentinel values
//! - `Registry::run(0)` → `default_max_parallel` is substituted
//! - `gate_capacity = 0` → clamped to 1 (a gate that admits nothing would deadlock)
//!
//! # Example
//! ```
//! use taskgate::Config;
//!
//! let mut cfg = Config::default();
//! cfg.default_max_parallel = 4;
//! cfg.gate_capacity = 100;
//! cfg.verbose = true;
//!
//! assert_eq!(cfg.max_parallel_or_default(0), 4);
//! assert_eq!(cfg.max_parallel_or_default(2), 2);
//! ```

use std::num::NonZero;

/// Configuration for the registry and the gated executor.
///
/// ## Field semantics
/// - `default_max_parallel`: parallelism used by `Registry::run` when the caller passes `< 1`
/// - `gate_capacity`: total weight the executor's gate admits at once
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `pool_max_idle`: how many reset pipeline builders the pool keeps around
/// - `verbose`: log a notice whenever a pipeline has to wait for a gate slot
#[derive(Clone, Debug)]
pub struct Config {
    /// Parallelism limit substituted when `Registry::run` receives a value below 1.
    pub default_max_parallel: usize,

    /// Capacity of the executor's weighted gate.
    ///
    /// Every fire-and-forget unit and every pipeline execution holds weight 1
    /// while it runs.
    pub gate_capacity: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Maximum number of idle builders kept by the pipeline builder pool.
    pub pool_max_idle: usize,

    /// Emit a visible notice when a pipeline blocks on the gate.
    pub verbose: bool,
}

impl Config {
    /// Returns `requested`, or the configured default when `requested < 1`.
    #[inline]
    pub fn max_parallel_or_default(&self, requested: usize) -> usize {
        if requested >= 1 {
            requested
        } else {
            self.default_max_parallel.max(1)
        }
    }

    /// Returns the gate capacity clamped to a minimum of 1.
    #[inline]
    pub fn gate_capacity_clamped(&self) -> usize {
        self.gate_capacity.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `default_max_parallel` = available hardware parallelism (1 if unknown)
    /// - `gate_capacity = 100`
    /// - `bus_capacity = 1024`
    /// - `pool_max_idle = 64`
    /// - `verbose = false`
    fn default() -> Self {
        Self {
            default_max_parallel: std::thread::available_parallelism()
                .map(NonZero::get)
                .unwrap_or(1),
            gate_capacity: 100,
            bus_capacity: 1024,
            pool_max_idle: 64,
            verbose: false,
        }
    }
}
