//! CLI error type.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use inkflow::{ConfigError, EngineError};

/// Errors reported by CLI commands. Every variant exits with status 1.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or unreadable smoothing configuration.
    Config(String),
    /// File could not be read or written.
    Io { path: PathBuf, source: io::Error },
    /// Stroke file is not valid JSON for a stroke.
    Json { path: PathBuf, message: String },
    /// Smoothed strokes could not be encoded for output.
    Encode(String),
    /// Engine failed to start.
    Engine(String),
}

impl CliError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(path: &Path, source: io::Error) -> Self {
        CliError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Wraps a JSON error with the path it concerns.
    pub fn json(path: &Path, error: impl fmt::Display) -> Self {
        CliError::Json {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            CliError::Json { path, message } => {
                write!(f, "{}: invalid stroke data: {}", path.display(), message)
            }
            CliError::Encode(msg) => write!(f, "Failed to encode smoothed strokes: {}", msg),
            CliError::Engine(msg) => write!(f, "Engine error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Engine(e.to_string())
    }
}
