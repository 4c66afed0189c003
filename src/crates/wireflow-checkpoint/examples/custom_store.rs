//! Example of snapshot storage backends
//!
//! Shows the snapshot lifecycle against the built-in in-memory store, and the
//! pattern for plugging in a database-backed store of your own.
//!
//! For a custom backend, implement `SnapshotStore` over your storage system:
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use wireflow_checkpoint::{CheckpointError, Result, RunStack, SnapshotStore, SnapshotStream};
//!
//! struct SqliteSnapshotStore {
//!     pool: sqlx::SqlitePool,
//! }
//!
//! #[async_trait]
//! impl SnapshotStore for SqliteSnapshotStore {
//!     async fn put(&self, stack: &RunStack) -> Result<()> {
//!         let body = stack.to_bytes()?;
//!         sqlx::query("INSERT INTO snapshots (run_id, ts, body) VALUES (?, ?, ?)")
//!             .bind(&stack.run_id)
//!             .bind(stack.ts)
//!             .bind(body)
//!             .execute(&self.pool)
//!             .await
//!             .map_err(|e| CheckpointError::storage(e.to_string()))?;
//!         Ok(())
//!     }
//!
//!     async fn latest(&self, run_id: &str) -> Result<Option<RunStack>> {
//!         // SELECT body FROM snapshots WHERE run_id = ? ORDER BY ts DESC LIMIT 1
//!         // then RunStack::from_bytes(&body); decode failures surface as Corrupt.
//!         todo!()
//!     }
//!
//!     async fn list(&self, run_id: &str) -> Result<SnapshotStream> {
//!         // stream rows oldest first, decoding each body
//!         todo!()
//!     }
//! }
//! ```

use futures::StreamExt;
use serde_json::json;
use wireflow_checkpoint::{InMemorySnapshotStore, RunFrame, RunStack, SnapshotStore};

#[tokio::main]
async fn main() -> wireflow_checkpoint::Result<()> {
    println!("=== Snapshot Store Example ===\n");

    let store = InMemorySnapshotStore::new();

    // A run making progress: one snapshot per step.
    for step in 1..=3u64 {
        let stack = RunStack::new("demo-run").with_frames(vec![RunFrame::active(
            "file:///board.json",
            step,
            json!({"pending": 3 - step}),
        )]);
        store.put(&stack).await?;
    }

    // A deeper snapshot: the run paused two sub-graphs in.
    let nested = RunStack::new("demo-run").with_frames(vec![
        RunFrame::suspended(
            "file:///board.json",
            4,
            json!({"parked_at": "invoke-tools"}),
            json!({"query": "weather in Lisbon"}),
        ),
        RunFrame::active("file:///board.json#tools", 1, json!({"pending": 1})),
    ]);
    store.put(&nested).await?;

    let latest = store.latest("demo-run").await?.expect("snapshot saved");
    println!(
        "latest snapshot: depth={}, active frame at {} ({} steps in)",
        latest.depth(),
        latest.active().map(RunFrame::graph_url).unwrap_or("?"),
        latest.active().map(RunFrame::node_count).unwrap_or(0),
    );

    let history: Vec<usize> = store
        .list("demo-run")
        .await?
        .map(|stack| stack.map(|s| s.depth()).unwrap_or(0))
        .collect()
        .await;
    println!("history of frame depths: {history:?}");

    // Round-trip through bytes, the way a database backend would store it.
    let bytes = latest.to_bytes()?;
    let restored = RunStack::from_bytes(&bytes)?;
    assert_eq!(latest, restored);
    println!("byte round-trip ok ({} bytes)", bytes.len());

    Ok(())
}
