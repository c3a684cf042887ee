//! Rolling smoothing latency statistics.
//!
//! Keeps the most recent [`DEFAULT_CAPACITY`] durations in a FIFO. The
//! monitor is informational only; nothing in the scheduler reads it.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

/// Number of samples retained before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 100;

/// Snapshot of recorded durations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PerformanceSummary {
    /// Mean duration in milliseconds.
    pub avg_ms: f64,
    /// Longest retained duration in milliseconds.
    pub max_ms: f64,
    /// Number of retained samples.
    pub sample_count: usize,
}

/// Bounded FIFO of processing durations.
#[derive(Debug)]
pub struct PerformanceMonitor {
    samples: Mutex<VecDeque<Duration>>,
    capacity: usize,
}

impl PerformanceMonitor {
    /// Creates a monitor retaining [`DEFAULT_CAPACITY`] samples.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a monitor retaining `capacity` samples (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Records one duration, evicting the oldest when full.
    pub fn record(&self, duration: Duration) {
        let mut samples = self.samples.lock();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(duration);
    }

    /// Average, maximum and count over the retained samples.
    pub fn summary(&self) -> PerformanceSummary {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return PerformanceSummary::default();
        }

        let total: f64 = samples.iter().map(duration_ms).sum();
        let max_ms = samples.iter().map(duration_ms).fold(0.0, f64::max);
        PerformanceSummary {
            avg_ms: total / samples.len() as f64,
            max_ms,
            sample_count: samples.len(),
        }
    }

    /// Number of retained samples.
    pub fn sample_count(&self) -> usize {
        self.samples.lock().len()
    }

    /// Discards all samples.
    pub fn reset(&self) {
        self.samples.lock().clear();
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_ms(duration: &Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
