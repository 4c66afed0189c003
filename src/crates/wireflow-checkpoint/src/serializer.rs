//! Serialization protocol for snapshots

use crate::error::{CheckpointError, Result};
use serde::{Deserialize, Serialize};

/// Protocol for encoding and decoding snapshot data
///
/// Implementations choose the byte format (JSON, bincode, compressed
/// variants). Decode failures are reported as [`CheckpointError::Corrupt`]:
/// on the load path the stored bytes are the source of truth, and bytes that
/// do not decode are by definition corrupt.
pub trait SnapshotSerializer: Send + Sync {
    /// Serialize a value to bytes
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize a value from bytes
    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T>;
}

/// JSON serializer (default): self-describing and diffable
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl SnapshotSerializer for JsonSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T> {
        serde_json::from_slice(data).map_err(|e| CheckpointError::corrupt(e.to_string()))
    }
}

/// Binary serializer using bincode: compact, not self-describing
///
/// Only suits payloads whose `Deserialize` never needs `deserialize_any`.
/// Free-form [`serde_json::Value`] fields and internally tagged enums (a
/// [`RunStack`](crate::RunStack)'s frames are both) require a self-describing
/// format such as [`JsonSerializer`].
#[derive(Debug, Clone, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl SnapshotSerializer for BincodeSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T> {
        bincode::deserialize(data).map_err(|e| CheckpointError::corrupt(e.to_string()))
    }
}
