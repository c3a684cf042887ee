//! Engine construction errors.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while building a [`SmoothingEngine`](super::SmoothingEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The worker thread pool could not be created.
    #[error("failed to start smoothing worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// The initial configuration was rejected.
    #[error("invalid smoothing configuration: {0}")]
    Config(#[from] ConfigError),
}
