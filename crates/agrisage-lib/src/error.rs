//! Error types for artifact loading and model invocation
//!
//! Neither type ever reaches a resolve caller: both are consumed by the
//! resolver and turned into a heuristic fallback.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons an artifact could not be made available for a task
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {} is {size} bytes, limit is {limit}", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("invalid manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build model from {}: {reason}", path.display())]
    Model { path: PathBuf, reason: String },
}

impl ArtifactError {
    /// Missing files are the normal case for an untrained task
    pub fn is_missing(&self) -> bool {
        matches!(self, ArtifactError::NotFound { .. })
    }
}

/// Reasons a loaded artifact failed to produce a prediction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("input has {actual} columns, model expects {expected}")]
    ColumnMismatch { expected: usize, actual: usize },

    #[error("model produced no output")]
    EmptyOutput,

    #[error("model produced non-finite output {0}")]
    NonFinite(f64),

    #[error("inference failed: {0}")]
    Runtime(String),
}
