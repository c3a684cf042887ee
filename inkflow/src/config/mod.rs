//! Smoothing configuration and quality tiers.
//!
//! [`SmoothingConfig`] is a plain value object. The engine validates it on
//! construction and on every update, then shares it with jobs behind an
//! `Arc`, so a running job never observes a half-applied change.
//!
//! # Quality Tiers
//!
//! ```text
//! tier         strength  interval  steps  tension  concurrency
//! performance  0.3       3.0       6      0.3      1
//! balanced     0.5       1.5       12     0.4      2
//! quality      0.8       0.5       24     0.5      4
//! ```
//!
//! Switching tiers replaces those five values together. The `use_async` and
//! `use_hardware_acceleration` preferences are owned by the caller and
//! survive tier changes.

mod settings;

pub use settings::{config_from_ini, load_config, parse_config, write_config, SMOOTHING_SECTION};

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Default upper bound on output points for a single stroke.
pub const DEFAULT_MAX_POINTS_PER_STROKE: usize = 10_000;

/// Largest accepted interpolation step count.
pub const MAX_INTERPOLATION_STEPS: usize = 50;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field is outside its valid range.
    #[error("{field} = {value} is out of range (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A settings value could not be parsed.
    #[error("invalid value '{value}' for setting '{key}'")]
    Parse { key: String, value: String },

    /// Settings file could not be read or written.
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid INI.
    #[error("settings file is malformed: {0}")]
    Ini(String),
}

/// Named parameter bundles trading smoothness against CPU cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Cheapest: coarse resampling, few interpolation steps, single worker.
    Performance,
    /// Middle ground suitable for most hardware.
    #[default]
    Balanced,
    /// Fine resampling and dense interpolation.
    Quality,
}

/// The five values a tier controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierParameters {
    pub smoothing_strength: f64,
    pub resample_interval: f64,
    pub interpolation_steps: usize,
    pub curve_tension: f64,
    pub concurrency_limit: usize,
}

impl QualityTier {
    /// All tiers from cheapest to most expensive.
    pub const ALL: [QualityTier; 3] = [
        QualityTier::Performance,
        QualityTier::Balanced,
        QualityTier::Quality,
    ];

    /// Returns the fixed parameter tuple for this tier.
    pub fn parameters(self) -> TierParameters {
        match self {
            QualityTier::Performance => TierParameters {
                smoothing_strength: 0.3,
                resample_interval: 3.0,
                interpolation_steps: 6,
                curve_tension: 0.3,
                concurrency_limit: 1,
            },
            QualityTier::Balanced => TierParameters {
                smoothing_strength: 0.5,
                resample_interval: 1.5,
                interpolation_steps: 12,
                curve_tension: 0.4,
                concurrency_limit: 2,
            },
            QualityTier::Quality => TierParameters {
                smoothing_strength: 0.8,
                resample_interval: 0.5,
                interpolation_steps: 24,
                curve_tension: 0.5,
                concurrency_limit: 4,
            },
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityTier::Performance => write!(f, "performance"),
            QualityTier::Balanced => write!(f, "balanced"),
            QualityTier::Quality => write!(f, "quality"),
        }
    }
}

impl std::str::FromStr for QualityTier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "performance" => Ok(Self::Performance),
            "balanced" => Ok(Self::Balanced),
            "quality" => Ok(Self::Quality),
            _ => Err(ConfigError::Parse {
                key: "quality".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Parameters for one smoothing pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothingConfig {
    /// Neighbour relaxation strength (0.0 - 1.0).
    pub smoothing_strength: f64,

    /// Arc-length spacing used by the resampler; half of it is the
    /// noise filter's minimum sample spacing.
    pub resample_interval: f64,

    /// Bézier evaluation steps per window (1 - 50).
    pub interpolation_steps: usize,

    /// Control point offset as a fraction of chord length (0.0 - 1.0).
    pub curve_tension: f64,

    /// Scale interpolation steps with window length and curvature.
    pub adaptive_interpolation: bool,

    /// Results above this many points fall back to the original stroke.
    pub max_points_per_stroke: usize,

    /// Maximum concurrent geometry computations.
    pub concurrency_limit: usize,

    /// Tier the tier-controlled values were taken from.
    pub quality_tier: QualityTier,

    /// Schedule smoothing on the worker pool. When false, requests are
    /// smoothed inline under the synchronous time budget.
    pub use_async: bool,

    /// Use the data-parallel fitter.
    pub use_hardware_acceleration: bool,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self::for_tier(QualityTier::Balanced)
    }
}

impl SmoothingConfig {
    /// Creates a config from a tier with default preferences.
    pub fn for_tier(tier: QualityTier) -> Self {
        let base = Self {
            smoothing_strength: 0.0,
            resample_interval: 1.0,
            interpolation_steps: 1,
            curve_tension: 0.0,
            adaptive_interpolation: true,
            max_points_per_stroke: DEFAULT_MAX_POINTS_PER_STROKE,
            concurrency_limit: 1,
            quality_tier: tier,
            use_async: true,
            use_hardware_acceleration: false,
        };
        base.with_tier(tier)
    }

    /// Returns a copy with all tier-controlled values replaced.
    ///
    /// `use_async`, `use_hardware_acceleration`, `adaptive_interpolation` and
    /// `max_points_per_stroke` are kept.
    pub fn with_tier(&self, tier: QualityTier) -> Self {
        let params = tier.parameters();
        Self {
            smoothing_strength: params.smoothing_strength,
            resample_interval: params.resample_interval,
            interpolation_steps: params.interpolation_steps,
            curve_tension: params.curve_tension,
            concurrency_limit: params.concurrency_limit,
            quality_tier: tier,
            ..self.clone()
        }
    }

    /// Set the concurrency limit.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Set the async preference.
    pub fn with_async(mut self, enabled: bool) -> Self {
        self.use_async = enabled;
        self
    }

    /// Set the hardware acceleration preference.
    pub fn with_hardware_acceleration(mut self, enabled: bool) -> Self {
        self.use_hardware_acceleration = enabled;
        self
    }

    /// Set the per-stroke point budget.
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points_per_stroke = max_points;
        self
    }

    /// Checks every field against its valid range.
    ///
    /// Out-of-range values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.smoothing_strength) {
            return Err(out_of_range(
                "smoothing_strength",
                self.smoothing_strength,
                "0.0..=1.0",
            ));
        }
        if !self.resample_interval.is_finite() || self.resample_interval <= 0.0 {
            return Err(out_of_range(
                "resample_interval",
                self.resample_interval,
                "> 0",
            ));
        }
        if self.interpolation_steps == 0 || self.interpolation_steps > MAX_INTERPOLATION_STEPS {
            return Err(out_of_range(
                "interpolation_steps",
                self.interpolation_steps,
                "1..=50",
            ));
        }
        if !(0.0..=1.0).contains(&self.curve_tension) {
            return Err(out_of_range(
                "curve_tension",
                self.curve_tension,
                "0.0..=1.0",
            ));
        }
        if self.concurrency_limit == 0 {
            return Err(out_of_range(
                "concurrency_limit",
                self.concurrency_limit,
                "> 0",
            ));
        }
        if self.max_points_per_stroke == 0 {
            return Err(out_of_range(
                "max_points_per_stroke",
                self.max_points_per_stroke,
                "> 0",
            ));
        }
        Ok(())
    }
}

fn out_of_range(field: &'static str, value: impl fmt::Display, expected: &'static str) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        value: value.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_balanced_and_valid() {
        let config = SmoothingConfig::default();
        assert_eq!(config.quality_tier, QualityTier::Balanced);
        assert!(config.use_async);
        assert!(!config.use_hardware_acceleration);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_every_tier_is_valid() {
        for tier in QualityTier::ALL {
            let config = SmoothingConfig::for_tier(tier);
            assert!(config.validate().is_ok(), "{} tier invalid", tier);
            assert_eq!(config.quality_tier, tier);
        }
    }

    #[test]
    fn test_tiers_are_ordered_by_cost() {
        let perf = QualityTier::Performance.parameters();
        let quality = QualityTier::Quality.parameters();
        assert!(perf.interpolation_steps < quality.interpolation_steps);
        assert!(perf.resample_interval > quality.resample_interval);
    }

    #[test]
    fn test_with_tier_replaces_tier_values() {
        let config = SmoothingConfig::for_tier(QualityTier::Performance);
        let upgraded = config.with_tier(QualityTier::Quality);
        let params = QualityTier::Quality.parameters();

        assert_eq!(upgraded.smoothing_strength, params.smoothing_strength);
        assert_eq!(upgraded.resample_interval, params.resample_interval);
        assert_eq!(upgraded.interpolation_steps, params.interpolation_steps);
        assert_eq!(upgraded.curve_tension, params.curve_tension);
        assert_eq!(upgraded.concurrency_limit, params.concurrency_limit);
        assert_eq!(upgraded.quality_tier, QualityTier::Quality);
    }

    #[test]
    fn test_with_tier_preserves_preferences() {
        let config = SmoothingConfig::default()
            .with_async(false)
            .with_hardware_acceleration(true)
            .with_max_points(500);
        let switched = config.with_tier(QualityTier::Performance);

        assert!(!switched.use_async);
        assert!(switched.use_hardware_acceleration);
        assert_eq!(switched.max_points_per_stroke, 500);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases: Vec<(&str, SmoothingConfig)> = vec![
            ("smoothing_strength", SmoothingConfig {
                smoothing_strength: 1.5,
                ..Default::default()
            }),
            ("resample_interval", SmoothingConfig {
                resample_interval: 0.0,
                ..Default::default()
            }),
            ("resample_interval", SmoothingConfig {
                resample_interval: f64::NAN,
                ..Default::default()
            }),
            ("interpolation_steps", SmoothingConfig {
                interpolation_steps: 0,
                ..Default::default()
            }),
            ("interpolation_steps", SmoothingConfig {
                interpolation_steps: 51,
                ..Default::default()
            }),
            ("curve_tension", SmoothingConfig {
                curve_tension: -0.1,
                ..Default::default()
            }),
            ("concurrency_limit", SmoothingConfig::default().with_concurrency_limit(0)),
            ("max_points_per_stroke", SmoothingConfig::default().with_max_points(0)),
        ];

        for (expected_field, config) in cases {
            match config.validate() {
                Err(ConfigError::OutOfRange { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected {} to be rejected, got {:?}", expected_field, other),
            }
        }
    }

    #[test]
    fn test_validate_accepts_boundaries() {
        let config = SmoothingConfig {
            smoothing_strength: 1.0,
            interpolation_steps: 50,
            curve_tension: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("quality".parse::<QualityTier>().unwrap(), QualityTier::Quality);
        assert_eq!(" Balanced ".parse::<QualityTier>().unwrap(), QualityTier::Balanced);
        assert_eq!(
            "PERFORMANCE".parse::<QualityTier>().unwrap(),
            QualityTier::Performance
        );
        assert!("ultra".parse::<QualityTier>().is_err());
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(format!("{}", QualityTier::Performance), "performance");
        assert_eq!(format!("{}", QualityTier::Balanced), "balanced");
        assert_eq!(format!("{}", QualityTier::Quality), "quality");
    }
}
