//! Concurrency limiter for geometry work.
//!
//! A tokio semaphore with in-flight and peak counters. The permit is moved
//! into the worker closure, so the slot stays taken until the geometry
//! actually stops running, even if the awaiting future is dropped first.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds how many smoothing computations run at once.
#[derive(Debug)]
pub struct WorkerLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl WorkerLimiter {
    /// Creates a limiter allowing `max_concurrent` permits (at least one).
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits for a permit.
    ///
    /// Returns `None` only if the semaphore has been closed.
    pub async fn acquire(&self) -> Option<WorkerPermit> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok()?;
        Some(self.track(permit))
    }

    /// Takes a permit if one is free right now.
    pub fn try_acquire(&self) -> Option<WorkerPermit> {
        let permit = Arc::clone(&self.semaphore).try_acquire_owned().ok()?;
        Some(self.track(permit))
    }

    fn track(&self, permit: OwnedSemaphorePermit) -> WorkerPermit {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        WorkerPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Configured permit count.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Permits currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits ever held at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Permits free right now.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// RAII permit; releases its slot on drop.
#[derive(Debug)]
pub struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for WorkerPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
