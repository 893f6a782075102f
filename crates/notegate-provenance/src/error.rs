//! Error types for read provenance
//!
//! None of these reach the orchestrator. The public total operations turn
//! them into "no evidence" or "read not recorded".

use std::path::PathBuf;

/// Errors from the session read store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Session id was empty
    #[error("session id is empty")]
    EmptySessionId,

    /// IO error on a store artifact
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read set exists but does not decode
    #[error("corrupt read set at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Read set could not be encoded
    #[error("failed to encode read set for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from scanning an interaction history
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// History source could not be opened
    #[error("history not readable at {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        assert_eq!(StoreError::EmptySessionId.to_string(), "session id is empty");
    }

    #[test]
    fn io_error_names_path() {
        let err = StoreError::io(
            "/state/reads/s1.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/state/reads/s1.json"));
    }
}
