//! Versioned run-stack snapshots
//!
//! This module defines the on-disk/on-wire form of a paused run: **[`RunStack`]**,
//! an ordered list of **[`RunFrame`]** values, one frame per nested graph
//! invocation, outermost first. A snapshot is everything a host needs to park a
//! run indefinitely (seconds while a model call is in flight, days while a
//! human decides) and later reconstruct the traversal exactly where it stopped.
//!
//! # Frame kinds
//!
//! The schema is explicitly tagged so corruption is detected structurally, not
//! by a failed downstream deserialization:
//!
//! - `suspended`: an outer frame parked at the node whose nested sub-graph
//!   invocation is in flight. Carries the frame's serialized traversal state
//!   and the input values that were passed into the sub-invocation.
//! - `active`: the innermost frame, the live traversal state of the run that
//!   was actually stepping when the snapshot was taken.
//!
//! A well-formed stack has at least one frame, its last frame is `active`, and
//! every other frame is `suspended`. [`RunStack::validate`] enforces this plus
//! the format version, and every decode path runs it.
//!
//! # Wire shape
//!
//! ```json
//! {
//!   "v": 1,
//!   "runId": "6f2c…",
//!   "ts": "2026-08-25T10:00:00Z",
//!   "frames": [
//!     { "kind": "suspended", "graphUrl": "file:///main.json", "nodeCount": 4,
//!       "state": { "…": "…" }, "inputs": { "query": "…" } },
//!     { "kind": "active", "graphUrl": "file:///main.json#summarize",
//!       "nodeCount": 1, "state": { "…": "…" } }
//!   ]
//! }
//! ```
//!
//! `state` is an engine-private blob (the traversal's serialized step and
//! ledger, plus the outputs the frame has collected so far); this crate stores
//! and validates it structurally but never interprets it. `nodeCount` counts
//! steps taken within that frame and exists for observability only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CheckpointError, Result};
use crate::serializer::{JsonSerializer, SnapshotSerializer};

/// Run identifier type
pub type RunId = String;

/// One call frame of a paused run
///
/// Frames are tagged by `kind` so a decoder can reject a malformed stack
/// without touching the engine-private `state` blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunFrame {
    /// An outer frame parked at the node whose nested invocation is in flight
    #[serde(rename_all = "camelCase")]
    Suspended {
        /// Url of the graph this frame is executing
        graph_url: String,
        /// Steps taken within this frame so far
        node_count: u64,
        /// Serialized traversal state of this frame, parked at the invoking node
        state: Value,
        /// Input values that were passed into the sub-invocation
        inputs: Value,
    },

    /// The innermost frame: the traversal that was live when the run paused
    #[serde(rename_all = "camelCase")]
    Active {
        /// Url of the graph this frame is executing
        graph_url: String,
        /// Steps taken within this frame so far
        node_count: u64,
        /// Serialized traversal state, positioned at the next pending step
        state: Value,
    },
}

impl RunFrame {
    /// Create a suspended (outer) frame
    pub fn suspended(
        graph_url: impl Into<String>,
        node_count: u64,
        state: Value,
        inputs: Value,
    ) -> Self {
        Self::Suspended {
            graph_url: graph_url.into(),
            node_count,
            state,
            inputs,
        }
    }

    /// Create the active (innermost) frame
    pub fn active(graph_url: impl Into<String>, node_count: u64, state: Value) -> Self {
        Self::Active {
            graph_url: graph_url.into(),
            node_count,
            state,
        }
    }

    /// Url of the graph this frame belongs to
    pub fn graph_url(&self) -> &str {
        match self {
            Self::Suspended { graph_url, .. } | Self::Active { graph_url, .. } => graph_url,
        }
    }

    /// Steps taken within this frame
    pub fn node_count(&self) -> u64 {
        match self {
            Self::Suspended { node_count, .. } | Self::Active { node_count, .. } => *node_count,
        }
    }

    /// Serialized traversal state carried by this frame
    pub fn state(&self) -> &Value {
        match self {
            Self::Suspended { state, .. } | Self::Active { state, .. } => state,
        }
    }

    /// Whether this frame is the live, innermost one
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// A serializable call stack for one paused run
///
/// Frames are ordered outermost first. The stack, not any individual frame,
/// is the unit that crosses process and storage boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStack {
    /// Snapshot format version (currently 1)
    pub v: u32,

    /// Identifier of the run this snapshot belongs to
    pub run_id: RunId,

    /// When the snapshot was taken
    pub ts: DateTime<Utc>,

    /// Call frames, outermost first; the last frame is the live one
    pub frames: Vec<RunFrame>,
}

impl RunStack {
    /// Current snapshot format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create an empty stack for a run
    ///
    /// An empty stack is not yet a valid snapshot; push at least an active
    /// frame before serializing.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            v: Self::CURRENT_VERSION,
            run_id: run_id.into(),
            ts: Utc::now(),
            frames: Vec::new(),
        }
    }

    /// Create a stack for a freshly generated run id
    pub fn for_new_run() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Set the frames, outermost first
    pub fn with_frames(mut self, frames: Vec<RunFrame>) -> Self {
        self.frames = frames;
        self
    }

    /// Push a frame onto the stack (innermost position)
    pub fn push(&mut self, frame: RunFrame) {
        self.frames.push(frame);
    }

    /// Number of nested invocations captured by this snapshot
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The live innermost frame, if the stack is well-formed enough to have one
    pub fn active(&self) -> Option<&RunFrame> {
        self.frames.last().filter(|frame| frame.is_active())
    }

    /// Check structural validity
    ///
    /// A valid stack has a supported version, at least one frame, an `active`
    /// frame in last position, and `suspended` frames everywhere else.
    pub fn validate(&self) -> Result<()> {
        if self.v != Self::CURRENT_VERSION {
            return Err(CheckpointError::UnsupportedVersion(self.v));
        }
        let Some(last) = self.frames.last() else {
            return Err(CheckpointError::corrupt("snapshot has no frames"));
        };
        if !last.is_active() {
            return Err(CheckpointError::corrupt(
                "innermost frame is not marked active",
            ));
        }
        if let Some(position) = self.frames[..self.frames.len() - 1]
            .iter()
            .position(|frame| frame.is_active())
        {
            return Err(CheckpointError::Corrupt(format!(
                "unexpected active frame at depth {position}"
            )));
        }
        Ok(())
    }

    /// Serialize with the default JSON serializer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_with(&JsonSerializer::new())
    }

    /// Deserialize and validate with the default JSON serializer
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with(&JsonSerializer::new(), data)
    }

    /// Serialize with a specific serializer
    pub fn to_bytes_with<S: SnapshotSerializer>(&self, serializer: &S) -> Result<Vec<u8>> {
        serializer.dumps(self)
    }

    /// Deserialize with a specific serializer, then validate
    pub fn from_bytes_with<S: SnapshotSerializer>(serializer: &S, data: &[u8]) -> Result<Self> {
        let stack: Self = serializer.loads(data)?;
        stack.validate()?;
        Ok(stack)
    }
}
