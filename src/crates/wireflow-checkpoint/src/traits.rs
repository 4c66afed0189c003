//! Extensible snapshot storage trait for custom backend implementations
//!
//! This module defines **[`SnapshotStore`]**, the abstraction a host implements
//! to persist [`RunStack`](crate::snapshot::RunStack) snapshots in its storage
//! system of choice (PostgreSQL, SQLite, Redis, object storage, …). The engine
//! treats the store as pass-through: snapshots go in as validated values and
//! come back out unchanged; the store never interprets frame state.
//!
//! # Overview
//!
//! Snapshot storage enables:
//!
//! - **Indefinite pauses** - park a run while a human answers an input prompt
//! - **Crash recovery** - resume from the last persisted step after a restart
//! - **Run history** - inspect how a run progressed, frame depth over time
//! - **Run isolation** - each run id keeps an independent snapshot history
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────────────────────┐
//!  │  Runner (wireflow-core)      │
//!  │  • after each step: put()    │
//!  │  • on resume: latest()       │
//!  └──────────────┬───────────────┘
//!                 │ SnapshotStore trait
//!                 ↓
//!  ┌──────────────────────────────┐
//!  │  Backend (your impl)         │
//!  │  InMemorySnapshotStore,      │
//!  │  Postgres, Redis, S3, …      │
//!  └──────────────────────────────┘
//! ```
//!
//! # Implementing a custom backend
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use wireflow_checkpoint::{Result, RunStack, SnapshotStore, SnapshotStream};
//!
//! struct PostgresSnapshotStore {
//!     pool: sqlx::PgPool,
//! }
//!
//! #[async_trait]
//! impl SnapshotStore for PostgresSnapshotStore {
//!     async fn put(&self, stack: &RunStack) -> Result<()> {
//!         let body = stack.to_bytes()?;
//!         sqlx::query("INSERT INTO snapshots (run_id, ts, body) VALUES ($1, $2, $3)")
//!             .bind(&stack.run_id)
//!             .bind(stack.ts)
//!             .bind(&body)
//!             .execute(&self.pool)
//!             .await
//!             .map_err(|e| wireflow_checkpoint::CheckpointError::storage(e.to_string()))?;
//!         Ok(())
//!     }
//!
//!     async fn latest(&self, run_id: &str) -> Result<Option<RunStack>> {
//!         // SELECT body ... ORDER BY ts DESC LIMIT 1, then RunStack::from_bytes
//!         todo!()
//!     }
//!
//!     async fn list(&self, run_id: &str) -> Result<SnapshotStream> {
//!         // stream rows oldest first, decoding each body
//!         todo!()
//!     }
//! }
//! ```
//!
//! Implementations must be `Send + Sync`; the runner may be driven from any
//! task. `latest` returns `Ok(None)` (not an error) when a run has no
//! snapshots yet.

use crate::error::{CheckpointError, Result};
use crate::snapshot::RunStack;
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

/// Type alias for an async stream of snapshots, oldest first
pub type SnapshotStream = Pin<Box<dyn Stream<Item = Result<RunStack>> + Send + 'static>>;

/// Storage backend for run-stack snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist one snapshot, keyed by its `run_id`
    ///
    /// Stores append: saving twice for the same run keeps both snapshots,
    /// with the later one becoming `latest`.
    async fn put(&self, stack: &RunStack) -> Result<()>;

    /// Fetch the most recent snapshot for a run, or `None`
    async fn latest(&self, run_id: &str) -> Result<Option<RunStack>>;

    /// Stream every snapshot recorded for a run, oldest first
    async fn list(&self, run_id: &str) -> Result<SnapshotStream>;

    /// Fetch the most recent snapshot for a run, failing if none exists
    async fn require_latest(&self, run_id: &str) -> Result<RunStack> {
        self.latest(run_id)
            .await?
            .ok_or_else(|| CheckpointError::NotFound(run_id.to_string()))
    }

    /// Delete all snapshots recorded for a run
    async fn delete_run(&self, run_id: &str) -> Result<()> {
        let _ = run_id;
        Ok(())
    }
}
