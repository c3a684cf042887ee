//! Neighbour relaxation driven by the smoothing strength.

use super::MIN_FIT_SAMPLES;
use crate::stroke::Sample;

/// Pulls each interior sample toward the midpoint of its neighbours.
///
/// The pull is `0.5 * strength` of the way to the midpoint, computed from the
/// original (not already relaxed) neighbours. Endpoints never move and
/// pressure is preserved.
pub fn relax(samples: &[Sample], strength: f64) -> Vec<Sample> {
    if samples.len() < MIN_FIT_SAMPLES || strength <= 0.0 {
        return samples.to_vec();
    }

    let weight = 0.5 * strength.min(1.0);
    let last_index = samples.len() - 1;

    let mut relaxed = Vec::with_capacity(samples.len());
    relaxed.push(samples[0]);
    for i in 1..last_index {
        let prev = &samples[i - 1];
        let current = &samples[i];
        let next = &samples[i + 1];
        let mid_x = (prev.x + next.x) * 0.5;
        let mid_y = (prev.y + next.y) * 0.5;
        relaxed.push(Sample::new(
            current.x + (mid_x - current.x) * weight,
            current.y + (mid_y - current.y) * weight,
            current.pressure,
        ));
    }
    relaxed.push(samples[last_index]);
    relaxed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_strength_is_identity() {
        let samples = vec![
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(1.0, 5.0, 0.5),
            Sample::new(2.0, 0.0, 0.5),
        ];
        assert_eq!(relax(&samples, 0.0), samples);
    }

    #[test]
    fn test_pulls_spike_down() {
        let samples = vec![
            Sample::new(0.0, 0.0, 0.5),
            Sample::new(1.0, 4.0, 0.5),
            Sample::new(2.0, 0.0, 0.5),
        ];
        let relaxed = relax(&samples, 1.0);
        assert_eq!(relaxed[1].y, 2.0);
        assert_eq!(relaxed[0], samples[0]);
        assert_eq!(relaxed[2], samples[2]);
    }

    #[test]
    fn test_line_stays_on_line() {
        let samples: Vec<Sample> = (0..6).map(|i| Sample::new(i as f64, 0.0, 0.5)).collect();
        let relaxed = relax(&samples, 0.8);
        assert!(relaxed.iter().all(|s| s.y == 0.0));
        assert_eq!(relaxed.len(), samples.len());
    }
}
