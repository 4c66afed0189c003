//! Error types for snapshot operations

use thiserror::Error;

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur while snapshotting or restoring a run
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// A stored snapshot failed structural validation or could not be decoded.
    /// The stored bytes are the source of truth and are never repaired.
    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    /// A snapshot was written by a format version this build does not support
    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    /// No snapshot exists for the requested run
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binary serialization error
    #[error("Binary serialization error: {0}")]
    Binary(#[from] bincode::Error),
}

impl CheckpointError {
    /// Create a corrupt-snapshot error
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}
