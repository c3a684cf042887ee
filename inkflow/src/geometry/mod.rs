//! Geometry library for stroke smoothing.
//!
//! Pure, synchronous functions over sample sequences. Nothing in here spawns
//! threads of its own or keeps state between calls; the coordinator decides
//! where the work runs.
//!
//! # Pipeline
//!
//! ```text
//! raw samples ─► filter ─► relax ─► fit ─► [resample if > 3x] ─► dedup ─► [gate at 2.5x]
//! ```
//!
//! Every stage returns its input unchanged when given fewer samples than it
//! needs, so a short stroke passes through untouched instead of failing.
//!
//! # Cancellation
//!
//! Long-running stages take an [`Interrupt`] and poll it at safe points. A
//! `CancellationToken` and a [`Deadline`] both implement it.

mod dedup;
mod filter;
mod fit;
mod pipeline;
mod relax;
mod resample;
mod vector;

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::SmoothError;

pub use dedup::dedup;
pub use filter::{filter_outliers, REVERSAL_ANGLE_DEG};
pub use fit::{
    fit_curve, window_curvature, BezierFitter, CurveFitter, FitParams, ParallelBezierFitter,
    MAX_ADAPTIVE_STEPS,
};
pub use pipeline::{
    PipelineOutcome, SmoothingPipeline, DEFAULT_DEDUP_DISTANCE, MAX_GROWTH_RATIO,
    RESAMPLE_TRIGGER_RATIO,
};
pub use relax::relax;
pub use resample::{resample, resample_interruptible};

/// Minimum samples needed for curve fitting.
pub const MIN_FIT_SAMPLES: usize = 3;

/// Minimum samples needed for resampling and filtering.
pub const MIN_PATH_SAMPLES: usize = 2;

/// Cooperative cancellation check polled by long-running stages.
pub trait Interrupt: Sync {
    /// Returns an error if the computation should stop now.
    fn check(&self) -> Result<(), SmoothError>;
}

impl Interrupt for CancellationToken {
    fn check(&self) -> Result<(), SmoothError> {
        if self.is_cancelled() {
            Err(SmoothError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Interrupt that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverInterrupt;

impl Interrupt for NeverInterrupt {
    fn check(&self) -> Result<(), SmoothError> {
        Ok(())
    }
}

/// Hard time bound for inline smoothing.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Returns true once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }
}

impl Interrupt for Deadline {
    fn check(&self) -> Result<(), SmoothError> {
        if self.is_expired() {
            Err(SmoothError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}
