use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{
    executor::{Executor, Shared},
    gate::WeightedGate,
    registry::Registry,
};
use crate::{
    config::Config,
    events::Bus,
    naming::{NameSource, UuidNames},
    pipeline::BuilderPool,
    subscribers::{Subscribe, spawn_listener},
};

/// Builder for a [`Registry`] with optional subscribers.
pub struct RegistryBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RegistryBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive unit lifecycle events through dedicated workers
    /// with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the registry.
    ///
    /// With subscribers attached this spawns a listener task, so it must be
    /// called inside a tokio runtime.
    pub fn build(self) -> Arc<Registry> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let _ = spawn_listener(&bus, self.subscribers);
        Registry::new_internal(self.cfg, bus)
    }
}

/// Builder for an [`Executor`] with optional subscribers and name source.
pub struct ExecutorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    names: Arc<dyn NameSource>,
}

impl ExecutorBuilder {
    /// Creates a new builder with the given configuration and [`UuidNames`].
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            names: Arc::new(UuidNames),
        }
    }

    /// Sets event subscribers for observability.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the source of generated unit and pipeline names.
    pub fn with_names(mut self, names: Arc<dyn NameSource>) -> Self {
        self.names = names;
        self
    }

    /// Builds the executor: gate, builder pool, event bus and subscriber workers.
    ///
    /// With subscribers attached this spawns a listener task, so it must be
    /// called inside a tokio runtime.
    pub fn build(self) -> Executor {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let _ = spawn_listener(&bus, self.subscribers);

        let shared = Shared::new(
            WeightedGate::new(self.cfg.gate_capacity_clamped()),
            BuilderPool::new(self.cfg.pool_max_idle),
            bus,
            self.names,
            CancellationToken::new(),
            self.cfg,
        );
        Executor::from_shared(shared)
    }
}
