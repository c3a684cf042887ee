//! The full smoothing pass over one stroke.
//!
//! ```text
//! filter ─► relax ─► fit ─► valve ─► dedup ─► gate
//!                            │                  │
//!                 > 3x input: resample   > 2.5x input or
//!                 at resample_interval   > max points: original
//! ```
//!
//! The interrupt is polled between stages, inside the fitter and inside the
//! resample walk.

use std::sync::Arc;

use tracing::{debug, trace};

use super::{
    dedup, filter_outliers, relax, resample_interruptible, BezierFitter, CurveFitter, FitParams,
    Interrupt, ParallelBezierFitter, MIN_FIT_SAMPLES,
};
use crate::config::SmoothingConfig;
use crate::error::SmoothError;
use crate::stroke::Sample;

/// Minimum spacing kept by the post-fit dedup stage.
pub const DEFAULT_DEDUP_DISTANCE: f64 = 0.1;

/// Fitted output above this multiple of the input length is resampled.
pub const RESAMPLE_TRIGGER_RATIO: f64 = 3.0;

/// Final output above this multiple of the input length is discarded.
pub const MAX_GROWTH_RATIO: f64 = 2.5;

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Smoothed samples, or a copy of the input when `fell_back` is set.
    pub samples: Vec<Sample>,
    /// The resample valve fired.
    pub resampled: bool,
    /// The result exceeded the point budget and the input was returned.
    pub fell_back: bool,
}

/// Runs the geometry stages in order with a chosen fitter.
#[derive(Clone)]
pub struct SmoothingPipeline {
    fitter: Arc<dyn CurveFitter>,
    dedup_distance: f64,
}

impl std::fmt::Debug for SmoothingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmoothingPipeline")
            .field("fitter", &self.fitter.name())
            .field("dedup_distance", &self.dedup_distance)
            .finish()
    }
}

impl SmoothingPipeline {
    /// Creates a pipeline around a fitter.
    pub fn new(fitter: Arc<dyn CurveFitter>) -> Self {
        Self {
            fitter,
            dedup_distance: DEFAULT_DEDUP_DISTANCE,
        }
    }

    /// Creates a pipeline with the fitter selected by
    /// `use_hardware_acceleration`.
    pub fn for_config(config: &SmoothingConfig) -> Self {
        if config.use_hardware_acceleration {
            Self::new(Arc::new(ParallelBezierFitter))
        } else {
            Self::new(Arc::new(BezierFitter))
        }
    }

    /// Set the dedup distance.
    pub fn with_dedup_distance(mut self, distance: f64) -> Self {
        self.dedup_distance = distance;
        self
    }

    /// Name of the configured fitter.
    pub fn fitter_name(&self) -> &'static str {
        self.fitter.name()
    }

    /// Smooths `samples` under `config`.
    ///
    /// # Errors
    ///
    /// - [`SmoothError::InsufficientInput`] for fewer than three samples
    /// - [`SmoothError::Cancelled`] / [`SmoothError::DeadlineExceeded`] when
    ///   the interrupt fires
    /// - [`SmoothError::NonFinite`] if any input or output coordinate is NaN
    ///   or infinite
    pub fn run(
        &self,
        samples: &[Sample],
        config: &SmoothingConfig,
        interrupt: &dyn Interrupt,
    ) -> Result<PipelineOutcome, SmoothError> {
        let original_len = samples.len();
        if original_len < MIN_FIT_SAMPLES {
            return Err(SmoothError::InsufficientInput {
                required: MIN_FIT_SAMPLES,
                actual: original_len,
            });
        }

        if samples.iter().any(|s| !s.is_finite()) {
            return Err(SmoothError::NonFinite);
        }

        interrupt.check()?;
        let filtered = filter_outliers(samples, config.resample_interval);
        let relaxed = relax(&filtered, config.smoothing_strength);

        interrupt.check()?;
        let mut fitted = self
            .fitter
            .fit(&relaxed, &FitParams::from_config(config), interrupt)?;
        trace!(
            fitter = self.fitter.name(),
            input = original_len,
            filtered = filtered.len(),
            fitted = fitted.len(),
            "Curve fitted"
        );

        interrupt.check()?;
        let resampled = fitted.len() as f64 > RESAMPLE_TRIGGER_RATIO * original_len as f64;
        if resampled {
            fitted = resample_interruptible(&fitted, config.resample_interval, interrupt)?;
            debug!(
                input = original_len,
                points = fitted.len(),
                interval = config.resample_interval,
                "Resample valve applied"
            );
        }

        let result = dedup(&fitted, self.dedup_distance);
        if result.iter().any(|s| !s.is_finite()) {
            return Err(SmoothError::NonFinite);
        }

        let limit = point_limit(original_len, config.max_points_per_stroke);
        if result.len() > limit {
            debug!(
                input = original_len,
                points = result.len(),
                limit,
                "Point budget exceeded, keeping original"
            );
            return Ok(PipelineOutcome {
                samples: samples.to_vec(),
                resampled,
                fell_back: true,
            });
        }

        Ok(PipelineOutcome {
            samples: result,
            resampled,
            fell_back: false,
        })
    }
}

impl Default for SmoothingPipeline {
    fn default() -> Self {
        Self::new(Arc::new(BezierFitter))
    }
}

/// Largest output accepted for an input of `original_len` samples.
fn point_limit(original_len: usize, max_points: usize) -> usize {
    let growth = (MAX_GROWTH_RATIO * original_len as f64).floor() as usize;
    growth.min(max_points)
}
