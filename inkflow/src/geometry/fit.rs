//! Sliding-window cubic Bézier fitting.
//!
//! Each window of four consecutive samples `p0..p3` contributes the curve
//! span from `p1` to `p2`. Tangents at `p1` and `p2` are averaged from the
//! neighbouring chord directions, and the control points sit
//! `|p2 - p1| * tension` along those tangents:
//!
//! ```text
//!   p0 ───── p1 ~~~~~~~~~~ p2 ───── p3
//!            c1 = p1 + t1·len·tension
//!                     c2 = p2 - t2·len·tension
//! ```
//!
//! The sequence is padded by repeating its first and last samples, so every
//! chord gets exactly one window. Each window emits `t ∈ (0, 1]`; the output
//! starts with the first sample and ends exactly on the last one, and no
//! window boundary is emitted twice.
//!
//! Two implementations share this contract: [`BezierFitter`] walks windows in
//! order, [`ParallelBezierFitter`] evaluates them on the rayon pool.

use std::f64::consts::PI;

use rayon::prelude::*;

use super::vector::Vec2;
use super::{Interrupt, NeverInterrupt, MIN_FIT_SAMPLES};
use crate::config::SmoothingConfig;
use crate::error::SmoothError;
use crate::stroke::{clamp_pressure, Sample};

/// Upper bound on adaptive interpolation steps per window.
pub const MAX_ADAPTIVE_STEPS: usize = 30;

/// Adaptive base steps scale with window arc length within this range.
const MIN_BASE_STEPS: f64 = 8.0;
const MAX_BASE_STEPS: f64 = 20.0;

/// Arc length units per adaptive base step.
const ARC_LENGTH_PER_STEP: f64 = 10.0;

/// Extra steps granted at maximum curvature.
const CURVATURE_STEP_WEIGHT: f64 = 15.0;

/// Windows between cancellation checks in the sequential fitter.
const CHECKPOINT_INTERVAL: usize = 64;

/// Parameters for a fitting pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    /// Interpolation steps per window (minimum when adaptive).
    pub steps: usize,
    /// Control point offset as a fraction of chord length.
    pub tension: f64,
    /// Scale steps with window length and curvature.
    pub adaptive: bool,
}

impl FitParams {
    /// Extracts fitting parameters from a smoothing config.
    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self {
            steps: config.interpolation_steps,
            tension: config.curve_tension,
            adaptive: config.adaptive_interpolation,
        }
    }
}

impl Default for FitParams {
    fn default() -> Self {
        Self::from_config(&SmoothingConfig::default())
    }
}

/// A curve fitting implementation.
///
/// Implementations must return the input unchanged for fewer than three
/// samples, begin with the first sample, end exactly on the last sample,
/// and clamp every emitted pressure.
pub trait CurveFitter: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Fits a smooth curve through the samples.
    fn fit(
        &self,
        samples: &[Sample],
        params: &FitParams,
        interrupt: &dyn Interrupt,
    ) -> Result<Vec<Sample>, SmoothError>;
}

/// Sequential fitter with periodic cancellation checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct BezierFitter;

impl CurveFitter for BezierFitter {
    fn name(&self) -> &'static str {
        "bezier"
    }

    fn fit(
        &self,
        samples: &[Sample],
        params: &FitParams,
        interrupt: &dyn Interrupt,
    ) -> Result<Vec<Sample>, SmoothError> {
        if samples.len() < MIN_FIT_SAMPLES {
            return Ok(samples.to_vec());
        }

        let segments = samples.len() - 1;
        let mut fitted = Vec::with_capacity(1 + segments * params.steps.max(1));
        fitted.push(first_sample(samples));

        for index in 0..segments {
            if index % CHECKPOINT_INTERVAL == 0 {
                interrupt.check()?;
            }
            emit_window(&window(samples, index), params, &mut fitted);
        }

        Ok(fitted)
    }
}

/// Data-parallel fitter: same curve, windows evaluated on the rayon pool.
///
/// When called from inside a rayon pool it uses that pool, so the engine's
/// worker pool bounds it as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelBezierFitter;

impl CurveFitter for ParallelBezierFitter {
    fn name(&self) -> &'static str {
        "parallel-bezier"
    }

    fn fit(
        &self,
        samples: &[Sample],
        params: &FitParams,
        interrupt: &dyn Interrupt,
    ) -> Result<Vec<Sample>, SmoothError> {
        if samples.len() < MIN_FIT_SAMPLES {
            return Ok(samples.to_vec());
        }

        let spans: Vec<Vec<Sample>> = (0..samples.len() - 1)
            .into_par_iter()
            .with_min_len(CHECKPOINT_INTERVAL)
            .map(|index| -> Result<Vec<Sample>, SmoothError> {
                if index % CHECKPOINT_INTERVAL == 0 {
                    interrupt.check()?;
                }
                let mut span = Vec::with_capacity(params.steps.max(1));
                emit_window(&window(samples, index), params, &mut span);
                Ok(span)
            })
            .collect::<Result<_, SmoothError>>()?;

        let total = 1 + spans.iter().map(Vec::len).sum::<usize>();
        let mut fitted = Vec::with_capacity(total);
        fitted.push(first_sample(samples));
        for span in spans {
            fitted.extend(span);
        }
        Ok(fitted)
    }
}

/// Fits with the sequential fitter and no cancellation.
pub fn fit_curve(samples: &[Sample], params: &FitParams) -> Vec<Sample> {
    match BezierFitter.fit(samples, params, &NeverInterrupt) {
        Ok(fitted) => fitted,
        Err(_) => samples.to_vec(),
    }
}

/// Normalized curvature of a four-sample window in `[0, 1]`.
///
/// The mean of the two turn angles between consecutive chords, divided by π.
/// Degenerate (zero-length) chords contribute no turn.
pub fn window_curvature(window: &[Sample; 4]) -> f64 {
    let [p0, p1, p2, p3] = window;
    let d0 = Vec2::between(p0, p1);
    let d1 = Vec2::between(p1, p2);
    let d2 = Vec2::between(p2, p3);
    let turn = d0.angle_to(d1) + d1.angle_to(d2);
    (turn / (2.0 * PI)).clamp(0.0, 1.0)
}

/// Window covering chord `index → index + 1`, padded at both ends.
fn window(samples: &[Sample], index: usize) -> [Sample; 4] {
    let last = samples.len() - 1;
    [
        samples[index.saturating_sub(1)],
        samples[index],
        samples[(index + 1).min(last)],
        samples[(index + 2).min(last)],
    ]
}

fn first_sample(samples: &[Sample]) -> Sample {
    let first = samples[0];
    Sample::new(first.x, first.y, first.pressure)
}

fn window_steps(window: &[Sample; 4], params: &FitParams) -> usize {
    let configured = params.steps.max(1);
    if !params.adaptive {
        return configured;
    }

    let [p0, p1, p2, p3] = window;
    let arc_length = p0.distance(p1) + p1.distance(p2) + p2.distance(p3);
    let base = (arc_length / ARC_LENGTH_PER_STEP).clamp(MIN_BASE_STEPS, MAX_BASE_STEPS);
    let curvature_steps = window_curvature(window) * CURVATURE_STEP_WEIGHT;
    let adaptive = (base + curvature_steps).round() as usize;

    adaptive.max(configured).min(MAX_ADAPTIVE_STEPS)
}

/// Appends the window's span `t ∈ (0, 1]` to `out`.
fn emit_window(window: &[Sample; 4], params: &FitParams, out: &mut Vec<Sample>) {
    let [p0, p1, p2, p3] = window;

    let chord = Vec2::between(p1, p2);
    let offset = chord.length() * params.tension;

    let direction = chord.normalized_or_zero();
    let tangent_start = (Vec2::between(p0, p1).normalized_or_zero() + direction) * 0.5;
    let tangent_end = (direction + Vec2::between(p2, p3).normalized_or_zero()) * 0.5;

    let start = Vec2::of(p1);
    let end = Vec2::of(p2);
    let control_start = start + tangent_start * offset;
    let control_end = end - tangent_end * offset;

    let steps = window_steps(window, params);
    for j in 1..=steps {
        let fraction = j as f32 / steps as f32;
        let pressure = clamp_pressure(p1.pressure + (p2.pressure - p1.pressure) * fraction);
        if j == steps {
            out.push(Sample::new(p2.x, p2.y, pressure));
            break;
        }
        let t = j as f64 / steps as f64;
        let point = cubic_bezier(start, control_start, control_end, end, t);
        out.push(Sample::new(point.x, point.y, pressure));
    }
}

fn cubic_bezier(p0: Vec2, c1: Vec2, c2: Vec2, p3: Vec2, t: f64) -> Vec2 {
    let u = 1.0 - t;
    let b0 = u * u * u;
    let b1 = 3.0 * u * u * t;
    let b2 = 3.0 * u * t * t;
    let b3 = t * t * t;
    p0 * b0 + c1 * b1 + c2 * b2 + p3 * b3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Deadline;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn params(steps: usize, tension: f64, adaptive: bool) -> FitParams {
        FitParams {
            steps,
            tension,
            adaptive,
        }
    }

    fn zigzag(count: usize) -> Vec<Sample> {
        (0..count)
            .map(|i| {
                let y = if i % 2 == 0 { 0.0 } else { 5.0 };
                Sample::new(i as f64 * 4.0, y, 0.2 + (i % 5) as f32 * 0.15)
            })
            .collect()
    }

    #[test]
    fn test_two_samples_unchanged() {
        let samples = vec![Sample::new(0.0, 0.0, 0.5), Sample::new(1.0, 1.0, 0.5)];
        assert_eq!(fit_curve(&samples, &params(10, 0.5, false)), samples);
    }

    #[test]
    fn test_zero_tension_line_stays_on_line() {
        let samples: Vec<Sample> = (0..10).map(|i| Sample::new(i as f64, 2.0 * i as f64, 0.5)).collect();
        let fitted = fit_curve(&samples, &params(8, 0.0, false));
        for point in &fitted {
            assert!((point.y - 2.0 * point.x).abs() < 1e-9, "{:?} off the line", point);
        }
    }

    #[test]
    fn test_straight_line_with_tension_stays_on_line() {
        let samples: Vec<Sample> = (0..10).map(|i| Sample::new(i as f64, 0.0, 0.5)).collect();
        let fitted = fit_curve(&samples, &params(8, 0.7, true));
        assert!(fitted.iter().all(|p| p.y.abs() < 1e-9));
    }

    #[test]
    fn test_point_count_and_endpoints() {
        let samples = zigzag(12);
        let fitted = fit_curve(&samples, &params(6, 0.4, false));
        assert_eq!(fitted.len(), 1 + 11 * 6);
        assert_eq!((fitted[0].x, fitted[0].y), (samples[0].x, samples[0].y));
        let last = fitted[fitted.len() - 1];
        assert_eq!((last.x, last.y), (samples[11].x, samples[11].y));
    }

    #[test]
    fn test_passes_through_every_input_sample_once() {
        let samples = zigzag(8);
        let fitted = fit_curve(&samples, &params(5, 0.5, false));
        for sample in &samples {
            let hits = fitted
                .iter()
                .filter(|p| p.x == sample.x && p.y == sample.y)
                .count();
            assert_eq!(hits, 1, "sample {:?} emitted {} times", sample, hits);
        }
    }

    #[test]
    fn test_no_duplicate_consecutive_points() {
        let samples = zigzag(10);
        let fitted = fit_curve(&samples, &params(7, 0.5, true));
        for pair in fitted.windows(2) {
            assert!(pair[0].distance(&pair[1]) > 0.0);
        }
    }

    #[test]
    fn test_pressure_clamped_and_interpolated() {
        let samples = vec![
            Sample {
                x: 0.0,
                y: 0.0,
                pressure: 0.0,
            },
            Sample {
                x: 10.0,
                y: 0.0,
                pressure: 0.0,
            },
            Sample {
                x: 20.0,
                y: 5.0,
                pressure: 1.0,
            },
        ];
        let fitted = fit_curve(&samples, &params(4, 0.5, false));
        assert!(fitted.iter().all(|p| p.pressure >= 0.1 && p.pressure <= 1.0));
        // second span rises from 0.1 toward 1.0
        assert!(fitted[5].pressure < fitted[8].pressure);
        assert_eq!(fitted[8].pressure, 1.0);
    }

    #[test]
    fn test_duplicate_samples_do_not_produce_nan() {
        let samples = vec![
            Sample::new(1.0, 1.0, 0.5),
            Sample::new(1.0, 1.0, 0.5),
            Sample::new(1.0, 1.0, 0.5),
            Sample::new(2.0, 2.0, 0.5),
        ];
        let fitted = fit_curve(&samples, &params(4, 0.5, true));
        assert!(fitted.iter().all(Sample::is_finite));
    }

    #[test]
    fn test_adaptive_steps_respect_bounds() {
        let straight = [
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(1.0, 0.0, 0.5),
            Sample::new(2.0, 0.0, 0.5),
            Sample::new(3.0, 0.0, 0.5),
        ];
        assert_eq!(window_steps(&straight, &params(4, 0.5, true)), 8);
        assert_eq!(window_steps(&straight, &params(12, 0.5, true)), 12);
        assert_eq!(window_steps(&straight, &params(45, 0.5, true)), MAX_ADAPTIVE_STEPS);
        assert_eq!(window_steps(&straight, &params(45, 0.5, false)), 45);

        // arc 300 -> base 20, two right angles -> +7.5
        let long_hook = [
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(100.0, 0.0, 0.5),
            Sample::new(100.0, 100.0, 0.5),
            Sample::new(0.0, 100.0, 0.5),
        ];
        let steps = window_steps(&long_hook, &params(4, 0.5, true));
        assert!((27..=28).contains(&steps), "got {}", steps);

        let long_reversal = [
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(100.0, 0.0, 0.5),
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(100.0, 0.0, 0.5),
        ];
        assert_eq!(window_steps(&long_reversal, &params(4, 0.5, true)), MAX_ADAPTIVE_STEPS);
    }

    #[test]
    fn test_window_curvature_range() {
        let straight = [
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(1.0, 0.0, 0.5),
            Sample::new(2.0, 0.0, 0.5),
            Sample::new(3.0, 0.0, 0.5),
        ];
        assert_eq!(window_curvature(&straight), 0.0);

        let square = [
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(1.0, 0.0, 0.5),
            Sample::new(1.0, 1.0, 0.5),
            Sample::new(0.0, 1.0, 0.5),
        ];
        assert!((window_curvature(&square) - 0.5).abs() < 1e-12);

        let reversal = [
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(1.0, 0.0, 0.5),
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(1.0, 0.0, 0.5),
        ];
        assert!((window_curvature(&reversal) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let samples = zigzag(300);
        let p = params(9, 0.45, true);
        let sequential = BezierFitter.fit(&samples, &p, &NeverInterrupt).unwrap();
        let parallel = ParallelBezierFitter.fit(&samples, &p, &NeverInterrupt).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_cancelled_fit_returns_error() {
        let token = CancellationToken::new();
        token.cancel();
        let samples = zigzag(10);
        assert_eq!(
            BezierFitter.fit(&samples, &params(4, 0.5, false), &token),
            Err(SmoothError::Cancelled)
        );
        assert_eq!(
            ParallelBezierFitter.fit(&samples, &params(4, 0.5, false), &token),
            Err(SmoothError::Cancelled)
        );
    }

    #[test]
    fn test_expired_deadline_stops_fit() {
        let deadline = Deadline::after(Duration::ZERO);
        let samples = zigzag(10);
        assert_eq!(
            BezierFitter.fit(&samples, &params(4, 0.5, false), &deadline),
            Err(SmoothError::DeadlineExceeded)
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_samples() -> impl Strategy<Value = Vec<Sample>> {
            prop::collection::vec(
                (-500.0..500.0_f64, -500.0..500.0_f64, -0.5..1.5_f32),
                3..60,
            )
            .prop_map(|raw| {
                raw.into_iter()
                    .map(|(x, y, pressure)| Sample { x, y, pressure })
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn test_fit_pressure_always_clamped(
                samples in arb_samples(),
                steps in 1usize..=50,
                tension in 0.0..=1.0_f64,
                adaptive in any::<bool>()
            ) {
                let fitted = fit_curve(&samples, &params(steps, tension, adaptive));
                for point in &fitted {
                    prop_assert!(point.pressure >= 0.1 && point.pressure <= 1.0);
                    prop_assert!(point.is_finite());
                }
            }

            #[test]
            fn test_fit_covers_endpoints(
                samples in arb_samples(),
                steps in 1usize..=20,
                tension in 0.0..=1.0_f64
            ) {
                let fitted = fit_curve(&samples, &params(steps, tension, false));
                let first = samples[0];
                let last = samples[samples.len() - 1];
                prop_assert_eq!((fitted[0].x, fitted[0].y), (first.x, first.y));
                let end = fitted[fitted.len() - 1];
                prop_assert_eq!((end.x, end.y), (last.x, last.y));
                prop_assert_eq!(fitted.len(), 1 + (samples.len() - 1) * steps);
            }
        }
    }
}
