//! # wireflow-checkpoint - Run Persistence for Graph Traversal
//!
//! **Versioned run-stack snapshots and pluggable snapshot stores** for pausing
//! and resuming wireflow graph runs. A run can stop between any two traversal
//! steps, persist itself as a [`RunStack`], and later continue as if the pause
//! never happened, including runs that are several sub-graph invocations deep.
//!
//! ## Overview
//!
//! A snapshot captures an entire call stack of nested graph invocations:
//!
//! - **[`RunStack`]** - the snapshot envelope: format version, run id,
//!   timestamp, and call frames ordered outermost first
//! - **[`RunFrame`]** - one nested invocation: `suspended` frames are parked at
//!   the node whose sub-graph is in flight, the single `active` frame is the
//!   traversal that was live when the run paused
//! - **[`SnapshotSerializer`]** - byte format protocol with
//!   [`JsonSerializer`] (default) and [`BincodeSerializer`] implementations
//! - **[`SnapshotStore`]** - async storage trait; [`InMemorySnapshotStore`] is
//!   the zero-setup reference backend for tests and development
//!
//! The frame schema is explicitly tagged and validated on every decode, so a
//! truncated or hand-edited snapshot surfaces as
//! [`CheckpointError::Corrupt`] instead of a misbehaving run.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wireflow_checkpoint::{
//!     InMemorySnapshotStore, RunFrame, RunStack, SnapshotStore,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> wireflow_checkpoint::Result<()> {
//!     // A single-frame snapshot: one graph, no nested invocations.
//!     let stack = RunStack::for_new_run().with_frames(vec![RunFrame::active(
//!         "file:///board.json",
//!         3,
//!         json!({"opportunities": [], "ledger": {}}),
//!     )]);
//!
//!     // Bytes for transport or storage...
//!     let bytes = stack.to_bytes()?;
//!     let restored = RunStack::from_bytes(&bytes)?;
//!     assert_eq!(stack, restored);
//!
//!     // ...or a store that keeps per-run history.
//!     let store = InMemorySnapshotStore::new();
//!     store.put(&stack).await?;
//!     let latest = store.latest(&stack.run_id).await?;
//!     assert!(latest.is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`snapshot`] - [`RunStack`] / [`RunFrame`] schema and validation
//! - [`serializer`] - byte format protocol and implementations
//! - [`traits`] - [`SnapshotStore`] storage abstraction
//! - [`memory`] - in-memory reference store
//! - [`error`] - [`CheckpointError`] and the crate [`Result`] alias
//!
//! ## See Also
//!
//! - `wireflow-core` - the traversal engine that produces and consumes these
//!   snapshots

pub mod error;
pub mod memory;
pub mod serializer;
pub mod snapshot;
pub mod traits;

pub use error::{CheckpointError, Result};
pub use memory::InMemorySnapshotStore;
pub use serializer::{BincodeSerializer, JsonSerializer, SnapshotSerializer};
pub use snapshot::{RunFrame, RunId, RunStack};
pub use traits::{SnapshotStore, SnapshotStream};
