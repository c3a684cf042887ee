//! Outlier and jitter filter.
//!
//! Drops samples that sit too close to the previously kept sample, and
//! samples where the pen doubles back on itself at a sharp angle. Both are
//! typical digitizer noise rather than intent.

use super::vector::Vec2;
use super::MIN_PATH_SAMPLES;
use crate::stroke::Sample;

/// Corner angle below which a sample is treated as jitter (degrees).
pub const REVERSAL_ANGLE_DEG: f64 = 30.0;

/// Fraction of the resample interval used as the minimum spacing.
const MIN_SPACING_FACTOR: f64 = 0.5;

/// Filters noise from a raw sample sequence.
///
/// A sample is dropped if it is closer than `0.5 * resample_interval` to the
/// last kept sample, or if the angle at it formed by
/// (last kept → sample → next) is below [`REVERSAL_ANGLE_DEG`]. The first and
/// last samples are always kept. Pressures are clamped.
pub fn filter_outliers(samples: &[Sample], resample_interval: f64) -> Vec<Sample> {
    if samples.len() < MIN_PATH_SAMPLES {
        return samples.iter().map(clamped).collect();
    }

    let min_distance = MIN_SPACING_FACTOR * resample_interval;
    let reversal = REVERSAL_ANGLE_DEG.to_radians();
    let last_index = samples.len() - 1;

    let mut kept = Vec::with_capacity(samples.len());
    kept.push(clamped(&samples[0]));

    for i in 1..last_index {
        let prev = kept[kept.len() - 1];
        let current = &samples[i];
        let next = &samples[i + 1];

        if prev.distance(current) < min_distance {
            continue;
        }

        if let Some(angle) = corner_angle(&prev, current, next) {
            if angle < reversal {
                continue;
            }
        }

        kept.push(clamped(current));
    }

    kept.push(clamped(&samples[last_index]));
    kept
}

/// Angle at `current` between the directions back to `prev` and on to `next`.
///
/// A straight continuation is π, a full reversal is 0. Returns `None` if
/// either neighbour coincides with `current`.
fn corner_angle(prev: &Sample, current: &Sample, next: &Sample) -> Option<f64> {
    let back = Vec2::between(current, prev);
    let forward = Vec2::between(current, next);
    if back.normalized_or_zero().is_zero() || forward.normalized_or_zero().is_zero() {
        return None;
    }
    Some(back.angle_to(forward))
}

fn clamped(sample: &Sample) -> Sample {
    Sample::new(sample.x, sample.y, sample.pressure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(count: usize, spacing: f64) -> Vec<Sample> {
        (0..count)
            .map(|i| Sample::new(i as f64 * spacing, 0.0, 0.5))
            .collect()
    }

    #[test]
    fn test_short_input_unchanged() {
        let one = vec![Sample::new(1.0, 2.0, 0.5)];
        assert_eq!(filter_outliers(&one, 1.0), one);
        assert!(filter_outliers(&[], 1.0).is_empty());
    }

    #[test]
    fn test_keeps_first_and_last() {
        let samples = line(20, 0.01);
        let filtered = filter_outliers(&samples, 2.0);
        assert_eq!(filtered.first(), samples.first());
        assert_eq!(filtered.last(), samples.last());
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_drops_samples_closer_than_half_interval() {
        // spacing 0.4, min distance 0.5: every other sample survives
        let samples = line(11, 0.4);
        let filtered = filter_outliers(&samples, 1.0);
        for pair in filtered[..filtered.len() - 1].windows(2) {
            assert!(pair[0].distance(&pair[1]) >= 0.5);
        }
        assert!(filtered.len() < samples.len());
    }

    #[test]
    fn test_keeps_straight_evenly_spaced_line() {
        let samples = line(10, 1.0);
        assert_eq!(filter_outliers(&samples, 1.0).len(), 10);
    }

    #[test]
    fn test_drops_sharp_reversal() {
        let samples = vec![
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(10.0, 0.0, 0.5),
            // spike: goes out and comes straight back
            Sample::new(20.0, 0.0, 0.5),
            Sample::new(11.0, 1.0, 0.5),
            Sample::new(11.0, 20.0, 0.5),
        ];
        let filtered = filter_outliers(&samples, 1.0);
        assert!(!filtered.contains(&Sample::new(20.0, 0.0, 0.5)));
        assert_eq!(filtered.first(), samples.first());
        assert_eq!(filtered.last(), samples.last());
    }

    #[test]
    fn test_keeps_right_angle_corner() {
        let samples = vec![
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(10.0, 0.0, 0.5),
            Sample::new(10.0, 10.0, 0.5),
        ];
        assert_eq!(filter_outliers(&samples, 1.0).len(), 3);
    }

    #[test]
    fn test_clamps_pressure() {
        let samples = vec![
            Sample {
                x: 0.0,
                y: 0.0,
                pressure: 0.0,
            },
            Sample {
                x: 5.0,
                y: 0.0,
                pressure: -1.0,
            },
            Sample {
                x: 10.0,
                y: 0.0,
                pressure: 2.0,
            },
        ];
        for sample in filter_outliers(&samples, 1.0) {
            assert!((0.1..=1.0).contains(&sample.pressure));
        }
    }

    #[test]
    fn test_single_sample_pressure_is_clamped() {
        let raw = Sample {
            x: 1.0,
            y: 1.0,
            pressure: 0.0,
        };
        let filtered = filter_outliers(&[raw], 1.0);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].pressure, 0.1);
    }
}
