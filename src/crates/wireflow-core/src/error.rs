//! Error types for graph construction, traversal, and runs
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.
//!
//! # Error Hierarchy
//!
//! ```text
//! TraversalError
//! ├── InvalidGraph    - Descriptor references unknown nodes or duplicates ids
//! ├── NoEntryNodes    - Graph has no node without incoming edges
//! ├── Node            - A node invocation failed (host-supplied message)
//! ├── StepLimit       - Runner guard against runaway cyclic graphs
//! ├── Checkpoint      - Snapshot persistence or validation failures
//! ├── Serialization   - JSON encode/decode failures
//! └── Yaml            - YAML descriptor parsing failures
//! ```
//!
//! # Which Errors Occur Where
//!
//! `InvalidGraph` is returned only by [`GraphView::new`](crate::GraphView::new);
//! `NoEntryNodes` only by [`Traversal::start`](crate::Traversal::start). The
//! traversal itself never fails after a successful start: a node whose required
//! inputs never arrive is skipped, not an error. `Node` and `StepLimit` are
//! produced by the [`Runner`](crate::Runner), which is one opinionated host
//! loop; hosts driving [`Traversal`](crate::Traversal) directly choose their
//! own failure policy.
//!
//! # Examples
//!
//! ```rust
//! use wireflow_core::{GraphDescriptor, GraphView, TraversalError};
//!
//! let descriptor: GraphDescriptor = serde_json::from_str(
//!     r#"{"nodes": [{"id": "a", "type": "start"}],
//!         "edges": [{"from": "a", "to": "missing"}]}"#,
//! ).unwrap();
//!
//! match GraphView::new(descriptor) {
//!     Err(TraversalError::InvalidGraph(msg)) => {
//!         assert!(msg.contains("missing"));
//!     }
//!     other => panic!("expected InvalidGraph, got {:?}", other.map(|_| ())),
//! }
//! ```

use thiserror::Error;

/// Result type for traversal operations
pub type Result<T> = std::result::Result<T, TraversalError>;

/// Errors that can occur while building a graph view or driving a run
///
/// # Examples
///
/// ```rust
/// use wireflow_core::TraversalError;
///
/// let err = TraversalError::node("summarize", "model unavailable");
/// assert_eq!(format!("{}", err), "Node 'summarize' failed: model unavailable");
/// ```
#[derive(Error, Debug)]
pub enum TraversalError {
    /// The descriptor is structurally unusable
    ///
    /// Returned at [`GraphView`](crate::GraphView) construction when an edge
    /// references a node id that does not exist, or two nodes share an id.
    /// Not recoverable; the descriptor must be fixed.
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// The graph has no entry nodes
    ///
    /// Every node has at least one incoming edge, so a fresh traversal has
    /// nowhere to begin. Cyclic graphs need at least one unwired node (or an
    /// explicit seed) to be runnable.
    #[error("Graph has no entry nodes")]
    NoEntryNodes,

    /// A node invocation failed
    ///
    /// The message is supplied by the host's [`NodeInvoker`](crate::NodeInvoker);
    /// the engine performs no retries and attaches no interpretation.
    #[error("Node '{node}' failed: {message}")]
    Node {
        /// Id of the node that failed
        node: String,
        /// Host-supplied failure description
        message: String,
    },

    /// The runner's configured step budget was exhausted
    ///
    /// The budget defaults to [`DEFAULT_MAX_STEPS`](crate::DEFAULT_MAX_STEPS)
    /// and is adjusted with [`RunConfig::with_max_steps`](crate::RunConfig::with_max_steps).
    /// The raw traversal has no limit.
    #[error("Run exceeded step limit of {0}")]
    StepLimit(usize),

    /// Snapshot persistence or validation failed
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] wireflow_checkpoint::CheckpointError),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML descriptor parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TraversalError {
    /// Create an invalid-graph error
    pub fn invalid_graph(message: impl Into<String>) -> Self {
        Self::InvalidGraph(message.into())
    }

    /// Create a node failure error with context
    pub fn node(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Node {
            node: node.into(),
            message: message.into(),
        }
    }
}
