//! Hardware-based configuration selection.
//!
//! ```text
//! cores >= 4 and hw   ─► Quality      concurrency min(cores, 8), hw path on
//! cores >= 2          ─► Balanced     concurrency min(cores, 4), hw path = hw
//! otherwise           ─► Performance  concurrency 1, hw path off, inline
//! ```

use std::num::NonZeroUsize;

use tracing::info;

use crate::config::{QualityTier, SmoothingConfig};

/// Concurrency cap for the quality tier.
const QUALITY_MAX_CONCURRENCY: usize = 8;

/// Concurrency cap for the balanced tier.
const BALANCED_MAX_CONCURRENCY: usize = 4;

/// Recommends a config for a machine with `core_count` cores.
///
/// # Arguments
///
/// * `core_count` - Logical cores available to the process
/// * `hw_available` - Whether the data-parallel fitter should be considered
pub fn recommended_config(core_count: usize, hw_available: bool) -> SmoothingConfig {
    if core_count >= 4 && hw_available {
        SmoothingConfig::for_tier(QualityTier::Quality)
            .with_concurrency_limit(core_count.min(QUALITY_MAX_CONCURRENCY))
            .with_hardware_acceleration(true)
    } else if core_count >= 2 {
        SmoothingConfig::for_tier(QualityTier::Balanced)
            .with_concurrency_limit(core_count.min(BALANCED_MAX_CONCURRENCY))
            .with_hardware_acceleration(hw_available)
    } else {
        SmoothingConfig::for_tier(QualityTier::Performance)
            .with_concurrency_limit(1)
            .with_hardware_acceleration(false)
            .with_async(false)
    }
}

/// Number of logical cores, or 1 if it cannot be determined.
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Recommends a config for the current machine.
pub fn detect(hw_available: bool) -> SmoothingConfig {
    let cores = available_cores();
    let config = recommended_config(cores, hw_available);
    info!(
        cores,
        hw_available,
        tier = %config.quality_tier,
        concurrency = config.concurrency_limit,
        "Detected smoothing quality"
    );
    config
}
