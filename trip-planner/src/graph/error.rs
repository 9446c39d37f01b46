//! Graph storage error types.

use std::path::PathBuf;

use crate::domain::DomainError;

/// Errors from loading or saving graph snapshots.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Reading or writing a snapshot file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot JSON could not be (de)serialized
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot content is inconsistent
    #[error("invalid snapshot: {0}")]
    Invalid(#[from] DomainError),

    /// Version string is not usable as a storage key
    #[error("invalid graph version {0:?}")]
    InvalidVersion(String),

    /// File content belongs to a different version
    #[error("snapshot file for {expected} contains version {found}")]
    VersionMismatch { expected: String, found: String },
}
