//! Per-stroke smoothing errors.
//!
//! None of these ever reach the caller of a smoothing request: the coordinator
//! maps every variant to "return the original stroke". They exist so the job
//! boundary can decide what to log and at which level.

use thiserror::Error;

/// Reasons a smoothing pass did not produce a new stroke.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SmoothError {
    /// The stroke has fewer samples than the stage needs.
    #[error("insufficient input: need at least {required} samples, got {actual}")]
    InsufficientInput { required: usize, actual: usize },

    /// Cooperative cancellation was observed.
    #[error("smoothing cancelled")]
    Cancelled,

    /// The inline time budget ran out.
    #[error("smoothing exceeded its time budget")]
    DeadlineExceeded,

    /// The pipeline produced NaN or infinite coordinates.
    #[error("smoothing produced non-finite coordinates")]
    NonFinite,

    /// A worker thread panicked while fitting.
    #[error("smoothing worker panicked: {0}")]
    WorkerPanicked(String),

    /// The worker dropped its result channel without answering.
    #[error("smoothing worker went away before returning a result")]
    WorkerLost,
}

impl SmoothError {
    /// Returns true for outcomes that are expected during normal drawing
    /// and must not be logged as errors.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InsufficientInput { .. } | Self::Cancelled | Self::DeadlineExceeded
        )
    }
}
