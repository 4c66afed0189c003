//! In-memory snapshot store for development and testing
//!
//! [`InMemorySnapshotStore`] keeps every snapshot in a process-local map keyed
//! by run id. It is the reference [`SnapshotStore`] implementation: zero setup
//! and ideal for tests, but unsuitable for production (all data is lost on
//! restart and memory grows with run length).
//!
//! # Example
//!
//! ```rust,ignore
//! use wireflow_checkpoint::{InMemorySnapshotStore, RunFrame, RunStack, SnapshotStore};
//! use serde_json::json;
//!
//! # async fn demo() -> wireflow_checkpoint::Result<()> {
//! let store = InMemorySnapshotStore::new();
//!
//! let stack = RunStack::new("run-1")
//!     .with_frames(vec![RunFrame::active("file:///board.json", 2, json!({}))]);
//! store.put(&stack).await?;
//!
//! let restored = store.latest("run-1").await?.unwrap();
//! assert_eq!(restored.active().unwrap().node_count(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! Instances are cheap to clone and share storage (`Arc` inside), so a test
//! can hand a clone to the runner and inspect the same store afterwards. The
//! `clear` helper resets state between test cases.

use crate::error::Result;
use crate::snapshot::RunStack;
use crate::traits::{SnapshotStore, SnapshotStream};
use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory snapshot storage, one history per run id
type SnapshotStorage = Arc<RwLock<HashMap<String, Vec<RunStack>>>>;

/// In-memory snapshot store
#[derive(Debug, Clone)]
pub struct InMemorySnapshotStore {
    storage: SnapshotStorage,
}

impl InMemorySnapshotStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of runs with at least one snapshot
    pub async fn run_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Total number of snapshots across all runs
    pub async fn snapshot_count(&self) -> usize {
        self.storage
            .read()
            .await
            .values()
            .map(|snapshots| snapshots.len())
            .sum()
    }

    /// Delete everything (useful between tests)
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put(&self, stack: &RunStack) -> Result<()> {
        let mut storage = self.storage.write().await;
        storage
            .entry(stack.run_id.clone())
            .or_default()
            .push(stack.clone());
        Ok(())
    }

    async fn latest(&self, run_id: &str) -> Result<Option<RunStack>> {
        let storage = self.storage.read().await;
        Ok(storage
            .get(run_id)
            .and_then(|snapshots| snapshots.last())
            .cloned())
    }

    async fn list(&self, run_id: &str) -> Result<SnapshotStream> {
        let storage = self.storage.read().await;
        let results: Vec<Result<RunStack>> = storage
            .get(run_id)
            .map(|snapshots| snapshots.iter().cloned().map(Ok).collect())
            .unwrap_or_default();
        Ok(Box::pin(stream::iter(results)))
    }

    async fn delete_run(&self, run_id: &str) -> Result<()> {
        self.storage.write().await.remove(run_id);
        Ok(())
    }
}
