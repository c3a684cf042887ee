//! Collapse runs of nearly coincident points.

use super::MIN_PATH_SAMPLES;
use crate::stroke::Sample;

/// Removes points closer than `min_distance` to the previously kept point.
///
/// The first point of a run is kept and closer followers are discarded. The
/// final sample always survives; if it lands too close to the last kept
/// point, it replaces that point instead.
pub fn dedup(samples: &[Sample], min_distance: f64) -> Vec<Sample> {
    if samples.len() < MIN_PATH_SAMPLES {
        return samples.to_vec();
    }

    let last = samples[samples.len() - 1];
    let mut kept: Vec<Sample> = Vec::with_capacity(samples.len());
    kept.push(samples[0]);

    for sample in &samples[1..samples.len() - 1] {
        if kept[kept.len() - 1].distance(sample) >= min_distance {
            kept.push(*sample);
        }
    }

    if kept.len() > 1 && kept[kept.len() - 1].distance(&last) < min_distance {
        kept.pop();
    }
    kept.push(last);
    kept
}
