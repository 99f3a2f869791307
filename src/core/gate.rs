//! # Weighted admission gate.
//!
//! [`WeightedGate`] bounds the total weight of in-flight work. Admission hands
//! out a [`GatePermit`]; dropping or releasing the permit returns its weight.
//!
//! ```text
//! acquire(w, token)
//!   ├─► w > capacity?  ──► CapacityExceeded (immediately, never waits)
//!   └─► select! {
//!         semaphore.acquire_many_owned(w) ──► Ok(GatePermit)
//!         token.cancelled()               ──► Cancelled
//!       }
//! ```
//!
//! ## Rules
//! - `in_flight() <= capacity()` at all times.
//! - A failed or cancelled wait has no side effect.
//! - Permits release on every exit path, panics included (RAII).
//! - No fairness contract between waiters of different weights.

use std::sync::Arc;

use tokio::select;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::error::GateError;

/// Counting gate over a fixed capacity.
#[derive(Debug, Clone)]
pub struct WeightedGate {
    sem: Arc<Semaphore>,
    capacity: u32,
}

/// Admission for some weight; returns it when dropped.
#[derive(Debug)]
#[must_use = "dropping the permit releases its weight immediately"]
pub struct GatePermit {
    permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Weight held by this permit.
    pub fn weight(&self) -> u32 {
        u32::try_from(self.permit.num_permits()).unwrap_or(u32::MAX)
    }

    /// Returns the weight to the gate.
    pub fn release(self) {
        drop(self);
    }
}

impl WeightedGate {
    /// Creates a gate admitting at most `capacity` weight (at least 1, at most what a semaphore and `u32` hold).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        let capacity = u32::try_from(capacity).unwrap_or(u32::MAX);
        Self {
            sem: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
        }
    }

    /// Total weight the gate admits at once.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Weight currently free.
    pub fn available(&self) -> u32 {
        u32::try_from(self.sem.available_permits()).unwrap_or(u32::MAX)
    }

    /// Weight currently held by permits.
    pub fn in_flight(&self) -> u32 {
        self.capacity.saturating_sub(self.available())
    }

    /// Admits `weight` if it fits right now.
    pub fn try_acquire(&self, weight: u32) -> Option<GatePermit> {
        if weight > self.capacity {
            return None;
        }
        Arc::clone(&self.sem)
            .try_acquire_many_owned(weight)
            .ok()
            .map(|permit| GatePermit { permit })
    }

    /// Waits until `weight` fits or `token` is cancelled.
    ///
    /// # Errors
    /// - [`GateError::CapacityExceeded`] if `weight > capacity` (checked before waiting)
    /// - [`GateError::Cancelled`] if `token` fires first
    /// - [`GateError::Closed`] if the gate was closed
    pub async fn acquire(
        &self,
        weight: u32,
        token: &CancellationToken,
    ) -> Result<GatePermit, GateError> {
        if weight > self.capacity {
            return Err(GateError::CapacityExceeded {
                requested: weight,
                capacity: self.capacity,
            });
        }
        if token.is_cancelled() {
            return Err(GateError::Cancelled);
        }

        let permit_future = Arc::clone(&self.sem).acquire_many_owned(weight);
        tokio::pin!(permit_future);

        select! {
            res = &mut permit_future => {
                res.map(|permit| GatePermit { permit }).map_err(|_closed| GateError::Closed)
            }
            _ = token.cancelled() => Err(GateError::Cancelled),
        }
    }

    /// Closes the gate: current waiters and future `acquire` calls fail with `Closed`.
    pub fn close(&self) {
        self.sem.close();
    }
}
