//! INI settings source for [`SmoothingConfig`].
//!
//! ```ini
//! [smoothing]
//! quality = balanced
//! strength = 0.5
//! resample_interval = 1.5
//! interpolation_steps = 12
//! curve_tension = 0.4
//! adaptive_interpolation = true
//! max_points_per_stroke = 10000
//! concurrency = 2
//! use_async = true
//! use_hardware_acceleration = false
//! ```
//!
//! The tier is applied first and explicit keys override it. Missing keys keep
//! the tier or default value. The result is validated before it is returned.

use std::path::Path;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::{ConfigError, QualityTier, SmoothingConfig};

/// INI section holding smoothing settings.
pub const SMOOTHING_SECTION: &str = "smoothing";

/// Loads and validates a config from an INI file.
pub fn load_config(path: &Path) -> Result<SmoothingConfig, ConfigError> {
    let ini = Ini::load_from_file(path).map_err(|e| match e {
        ini::Error::Io(io) => ConfigError::Io(io),
        ini::Error::Parse(parse) => ConfigError::Ini(parse.to_string()),
    })?;
    config_from_ini(&ini)
}

/// Parses and validates a config from INI text.
pub fn parse_config(text: &str) -> Result<SmoothingConfig, ConfigError> {
    let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Ini(e.to_string()))?;
    config_from_ini(&ini)
}

/// Builds a config from a parsed INI document.
pub fn config_from_ini(ini: &Ini) -> Result<SmoothingConfig, ConfigError> {
    let Some(section) = ini.section(Some(SMOOTHING_SECTION)) else {
        return Ok(SmoothingConfig::default());
    };

    let mut config = match section.get("quality") {
        Some(tier) => SmoothingConfig::for_tier(tier.parse()?),
        None => SmoothingConfig::default(),
    };

    if let Some(v) = parse_key::<f64>(section, "strength")? {
        config.smoothing_strength = v;
    }
    if let Some(v) = parse_key::<f64>(section, "resample_interval")? {
        config.resample_interval = v;
    }
    if let Some(v) = parse_key::<usize>(section, "interpolation_steps")? {
        config.interpolation_steps = v;
    }
    if let Some(v) = parse_key::<f64>(section, "curve_tension")? {
        config.curve_tension = v;
    }
    if let Some(v) = parse_bool(section, "adaptive_interpolation")? {
        config.adaptive_interpolation = v;
    }
    if let Some(v) = parse_key::<usize>(section, "max_points_per_stroke")? {
        config.max_points_per_stroke = v;
    }
    if let Some(v) = parse_key::<usize>(section, "concurrency")? {
        config.concurrency_limit = v;
    }
    if let Some(v) = parse_bool(section, "use_async")? {
        config.use_async = v;
    }
    if let Some(v) = parse_bool(section, "use_hardware_acceleration")? {
        config.use_hardware_acceleration = v;
    }

    config.validate()?;
    Ok(config)
}

/// Writes a config to an INI file, replacing it.
pub fn write_config(config: &SmoothingConfig, path: &Path) -> Result<(), ConfigError> {
    let mut ini = Ini::new();
    ini.with_section(Some(SMOOTHING_SECTION))
        .set("quality", config.quality_tier.to_string())
        .set("strength", config.smoothing_strength.to_string())
        .set("resample_interval", config.resample_interval.to_string())
        .set("interpolation_steps", config.interpolation_steps.to_string())
        .set("curve_tension", config.curve_tension.to_string())
        .set(
            "adaptive_interpolation",
            config.adaptive_interpolation.to_string(),
        )
        .set(
            "max_points_per_stroke",
            config.max_points_per_stroke.to_string(),
        )
        .set("concurrency", config.concurrency_limit.to_string())
        .set("use_async", config.use_async.to_string())
        .set(
            "use_hardware_acceleration",
            config.use_hardware_acceleration.to_string(),
        );
    ini.write_to_file(path)?;
    Ok(())
}

fn parse_key<T: FromStr>(section: &Properties, key: &str) -> Result<Option<T>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| parse_error(key, raw)),
    }
}

fn parse_bool(section: &Properties, key: &str) -> Result<Option<bool>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => Err(parse_error(key, raw)),
        },
    }
}

fn parse_error(key: &str, raw: &str) -> ConfigError {
    ConfigError::Parse {
        key: key.to_string(),
        value: raw.to_string(),
    }
}

impl QualityTier {
    /// Parses a tier name, falling back to `Balanced` for unknown names.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}
