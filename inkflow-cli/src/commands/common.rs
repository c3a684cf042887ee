//! Common types and helpers shared across CLI commands.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use inkflow::config::load_config;
use inkflow::{quality, QualityTier, SmoothingConfig, Stroke};

use crate::error::CliError;

/// Quality tier selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TierArg {
    /// Coarse and cheap, single worker
    Performance,
    /// Default trade-off
    Balanced,
    /// Dense interpolation, fine resampling
    Quality,
}

impl From<TierArg> for QualityTier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Performance => QualityTier::Performance,
            TierArg::Balanced => QualityTier::Balanced,
            TierArg::Quality => QualityTier::Quality,
        }
    }
}

/// Resolve the smoothing config from a settings file, tier flag and host.
///
/// The settings file wins over detection; the tier flag is applied last.
pub fn resolve_config(
    config_path: Option<&Path>,
    tier: Option<TierArg>,
) -> Result<SmoothingConfig, CliError> {
    let base = match config_path {
        Some(path) => load_config(path)?,
        None => quality::detect(false),
    };

    Ok(match tier {
        Some(tier) => base.with_tier(tier.into()),
        None => base,
    })
}

/// Strokes read from a file, remembering whether it held one or many.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeFile {
    pub strokes: Vec<Stroke>,
    pub single: bool,
}

/// Read a JSON file holding either one stroke or an array of strokes.
pub fn read_strokes(path: &Path) -> Result<StrokeFile, CliError> {
    let text = fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| CliError::json(path, e))?;

    if value.is_array() {
        let strokes = serde_json::from_value(value).map_err(|e| CliError::json(path, e))?;
        Ok(StrokeFile {
            strokes,
            single: false,
        })
    } else {
        let stroke = serde_json::from_value(value).map_err(|e| CliError::json(path, e))?;
        Ok(StrokeFile {
            strokes: vec![stroke],
            single: true,
        })
    }
}

/// Serialize strokes in the same shape they were read.
pub fn render_strokes(file: &StrokeFile) -> Result<String, serde_json::Error> {
    match (file.single, file.strokes.first()) {
        (true, Some(stroke)) => serde_json::to_string_pretty(stroke),
        _ => serde_json::to_string_pretty(&file.strokes),
    }
}
