//! Equidistant arc-length resampling.
//!
//! Used as a safety valve when curve fitting produced far more points than
//! the stroke started with, not as the primary smoothing step.

use super::{Interrupt, NeverInterrupt, MIN_PATH_SAMPLES};
use crate::error::SmoothError;
use crate::stroke::Sample;

/// Distance below which the tail sample is considered already emitted.
const TAIL_EPSILON: f64 = 1e-9;

/// Emitted points between cancellation checks.
const CHECKPOINT_INTERVAL: usize = 256;

/// Resamples a polyline at uniform arc-length spacing.
///
/// Walks the input accumulating distance. Whenever the accumulated distance
/// plus the remaining length of the current segment reaches `interval`, a
/// point is emitted at the exact boundary (position and pressure linearly
/// interpolated), the accumulator resets, and the rest of the same segment
/// is examined again. The first sample is always emitted. The last sample is
/// appended, or replaces the final boundary point when the walk ended on it.
///
/// Inputs with fewer than two samples, or a non-positive interval, are
/// returned unchanged.
pub fn resample(samples: &[Sample], interval: f64) -> Vec<Sample> {
    match resample_interruptible(samples, interval, &NeverInterrupt) {
        Ok(resampled) => resampled,
        Err(_) => samples.to_vec(),
    }
}

/// [`resample`] with a cancellation check every few hundred emitted points.
///
/// Boundaries are placed by their offset from the segment start, so every
/// step advances even when the interpolated coordinates collapse onto the
/// same `f64`.
pub fn resample_interruptible(
    samples: &[Sample],
    interval: f64,
    interrupt: &dyn Interrupt,
) -> Result<Vec<Sample>, SmoothError> {
    if samples.len() < MIN_PATH_SAMPLES || !interval.is_finite() || interval <= 0.0 {
        return Ok(samples.to_vec());
    }

    let first = samples[0];
    let last = samples[samples.len() - 1];

    let mut resampled = vec![Sample::new(first.x, first.y, first.pressure)];
    let mut accumulated = 0.0;

    for pair in samples.windows(2) {
        let (start, end) = (&pair[0], &pair[1]);
        let length = start.distance(end);
        if !length.is_finite() || length <= 0.0 {
            continue;
        }

        let mut offset = interval - accumulated;
        let mut last_emitted = None;
        while offset <= length {
            resampled.push(start.lerp(end, offset / length));
            last_emitted = Some(offset);
            if resampled.len() % CHECKPOINT_INTERVAL == 0 {
                interrupt.check()?;
            }

            let next = offset + interval;
            if next <= offset {
                break;
            }
            offset = next;
        }

        accumulated = match last_emitted {
            Some(at) => (length - at).max(0.0),
            None => accumulated + length,
        };
    }

    let tail = Sample::new(last.x, last.y, last.pressure);
    let len = resampled.len();
    match resampled.last_mut() {
        Some(end) if len > 1 && end.distance(&last) <= TAIL_EPSILON => *end = tail,
        _ => resampled.push(tail),
    }

    Ok(resampled)
}
