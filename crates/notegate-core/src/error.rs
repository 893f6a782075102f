//! Error types for notegate core
//!
//! Provides error handling for:
//! - Configuration loading
//! - Internal gate failures (converted to fail-closed verdicts)

use std::path::PathBuf;

/// Errors while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("io error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`crate::GateConfig`]
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure inside a gate while evaluating a request
///
/// Never surfaces to the orchestrator: the pipeline turns it into the failing
/// gate's conservative verdict.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Existence of the target could not be determined
    #[error("cannot determine whether {path} exists: {source}")]
    Existence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other internal fault
    #[error("internal gate error: {0}")]
    Internal(String),
}

/// Result type alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
