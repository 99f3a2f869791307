use parking_lot::Mutex;

use super::builder::PipelineBuilder;

/// Free list of reset pipeline builders.
///
/// A checked-out builder is owned by exactly one chain; `checkin` resets it
/// before it becomes available again.
#[derive(Debug)]
pub struct BuilderPool {
    free: Mutex<Vec<PipelineBuilder>>,
    max_idle: usize,
}

impl BuilderPool {
    /// Creates a pool keeping at most `max_idle` idle builders.
    pub fn new(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Takes an idle builder, or a fresh one when none is idle.
    pub fn checkout(&self) -> PipelineBuilder {
        self.free.lock().pop().unwrap_or_default()
    }

    /// Resets `builder` and keeps it for reuse (dropped if the pool is full).
    pub fn checkin(&self, mut builder: PipelineBuilder) {
        builder.reset();
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(builder);
        }
    }

    /// Number of idle builders.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}
