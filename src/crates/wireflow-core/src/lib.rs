//! # wireflow-core - Incremental Dataflow Graph Traversal
//!
//! **An engine for stepping through wired node graphs** - nodes connected by
//! directed, named-port edges execute one at a time as their inputs become
//! available, with queueing, cycles, pausing, and exact resumption built into
//! the model rather than bolted on.
//!
//! ## Overview
//!
//! `wireflow-core` executes graphs where edges carry data between named
//! ports. It provides:
//!
//! - **Incremental stepping** - One node at a time, pulled by the host
//! - **FIFO input queueing** - Multiple deliveries to one port wait in order
//! - **Constant wires** - Sticky values that survive consumption, for cycles
//! - **Wildcard fan-out** - `*` edges mirror every output to same-named inputs
//! - **Skip semantics** - Nodes with unsatisfied required inputs wait, never block
//! - **Checkpoint/resume** - Any step boundary serializes to a [`RunStack`]
//! - **Nested sub-graphs** - Graph-typed nodes run embedded graphs as calls
//! - **Async host loop** - An opinionated [`Runner`] over the raw traversal
//!
//! ## Core Concepts
//!
//! ### 1. Opportunities, Not Schedules
//!
//! There is no topological order. When a node produces outputs, each of its
//! outgoing edges becomes an *opportunity*: "this edge might now deliver a
//! value to its destination." Opportunities queue FIFO; the earliest one
//! picks the next node. Cycles are therefore ordinary - a back edge is just
//! another opportunity - and execution is deterministic for a fixed graph
//! and fixed outputs.
//!
//! ### 2. The Edge Ledger
//!
//! Delivered values wait in an [`EdgeLedger`], keyed by destination node and
//! input port: a FIFO queue per port plus a sticky store for `constant`
//! edges. Reading (`available_inputs`) never consumes; running a node
//! (`consume`) pops exactly the queue heads it used. Sticky values persist
//! until overwritten, which is what lets a cycle nibble the same context on
//! every lap.
//!
//! ### 3. Pull-Based Traversal
//!
//! [`Traversal::step`] takes the previous [`StepResult`] (outputs attached by
//! the host) and returns the next step or [`Step::Done`]. All mutable run
//! state rides inside the `StepResult`, so pausing is "stop calling step"
//! and checkpointing is "serialize the current result."
//!
//! ### 4. The Runner
//!
//! [`Runner`] wraps the traversal in an async loop: it invokes nodes through
//! a [`NodeInvoker`], answers `input` nodes, collects `output` nodes,
//! descends into sub-graphs, emits [`RunEvent`]s, and persists snapshots to
//! a [`SnapshotStore`] so a run can pause for days or survive a crash.
//!
//! ## Quick Start
//!
//! ### Stepping By Hand
//!
//! ```rust
//! use serde_json::{json, Map};
//! use wireflow_core::{GraphDescriptor, GraphView, Step, Traversal};
//!
//! let descriptor = GraphDescriptor::from_json_str(r#"{
//!     "nodes": [{"id": "a", "type": "seed"}, {"id": "b", "type": "show"}],
//!     "edges": [{"from": "a", "to": "b", "out": "x", "in": "y"}]
//! }"#).unwrap();
//!
//! let traversal = Traversal::new(GraphView::new(descriptor).unwrap());
//! let mut step = traversal.start().unwrap();
//!
//! loop {
//!     match traversal.step(step).unwrap() {
//!         Step::Done => break,
//!         Step::Next(mut next) => {
//!             if !next.skip {
//!                 // "Invoke" the node: echo a value out of port x.
//!                 let mut outputs = Map::new();
//!                 outputs.insert("x".to_string(), json!(42));
//!                 next.provide_outputs(outputs);
//!             }
//!             step = next;
//!         }
//!     }
//! }
//! ```
//!
//! ### Running With An Invoker
//!
//! ```rust
//! use serde_json::{json, Map};
//! use wireflow_core::{FnInvoker, GraphDescriptor, GraphView, RunConfig, Runner};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let descriptor = GraphDescriptor::from_yaml_str(r#"
//! nodes:
//!   - id: ask
//!     type: input
//!   - id: echo
//!     type: repeat
//!   - id: answer
//!     type: output
//! edges:
//!   - {from: ask, to: echo, out: text, in: text}
//!   - {from: echo, to: answer, out: text, in: text}
//! "#).unwrap();
//!
//! let invoker = FnInvoker::new(|_node, inputs| Ok(inputs));
//! let mut inputs = Map::new();
//! inputs.insert("text".to_string(), json!("hello"));
//!
//! let runner = Runner::new(GraphView::new(descriptor).unwrap(), invoker)
//!     .with_config(RunConfig::new().with_inputs(inputs));
//! let outputs = runner.run().await.unwrap().into_outputs().unwrap();
//! assert_eq!(outputs["text"], json!("hello"));
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//!                  ┌───────────────────────────────────────┐
//!                  │            Runner (async)             │
//!                  │  • NodeInvoker dispatch               │
//!                  │  • input/output node handling         │
//!                  │  • sub-graph descent                  │
//!                  │  • RunEvent emission                  │
//!                  └───────────┬───────────────▲───────────┘
//!                              │ step()        │ StepResult + outputs
//!                              ▼               │
//!                  ┌───────────────────────────┴───────────┐
//!                  │              Traversal                │
//!                  │  • FIFO opportunity queue             │
//!                  │  • missing-input skip check           │
//!                  │  • configuration merge                │
//!                  └───────────┬───────────────────────────┘
//!                              │ deliver / consume
//!                              ▼
//!                  ┌───────────────────────────────────────┐
//!                  │              EdgeLedger               │
//!                  │  • per-port FIFO queues               │
//!                  │  • sticky constants                   │
//!                  └───────────────────────────────────────┘
//!
//!                  GraphDescriptor ──▶ GraphView (validated, indexed)
//!                  StepResult ⟷ wireflow-checkpoint RunStack frames
//! ```
//!
//! ## Module Organization
//!
//! ### Core APIs (Start Here)
//! - [`graph`] - [`GraphDescriptor`], [`Edge`], [`GraphView`]
//! - [`traversal`] - [`Traversal`], [`StepResult`], the stepping algorithm
//! - [`runner`] - [`Runner`], [`RunConfig`], [`RunOutcome`]
//!
//! ### Execution Plumbing
//! - [`ledger`] - [`EdgeLedger`] queue and sticky-value bookkeeping
//! - [`invoker`] - [`NodeInvoker`] trait and [`FnInvoker`] adapter
//! - [`events`] - [`RunEvent`] and the event channel aliases
//! - [`error`] - [`TraversalError`] and the crate [`Result`] alias
//!
//! ## Performance Characteristics
//!
//! - **View construction**: O(nodes + edges), once per graph
//! - **Stepping**: O(incoming edges of the chosen node) per step
//! - **Checkpointing**: O(live state) serialization per persisted step
//! - **Events**: unbounded channel; sending never applies back-pressure
//!
//! ## See Also
//!
//! - [`wireflow_checkpoint`] - Snapshot schema, serializers, and stores

pub mod error;
pub mod events;
pub mod graph;
pub mod invoker;
pub mod ledger;
pub mod runner;
pub mod traversal;

// Re-export main types
pub use error::{Result, TraversalError};
pub use events::{
    event_channel, into_event_stream, EventReceiver, EventSender, EventStream, RunEvent,
};
pub use graph::{Edge, GraphDescriptor, GraphView, NodeDescriptor, NodeId, PortName, WILDCARD};
pub use invoker::{FnInvoker, NodeInvoker};
pub use ledger::EdgeLedger;
pub use runner::{RunConfig, RunOutcome, Runner, DEFAULT_MAX_STEPS, INPUT_TYPE, OUTPUT_TYPE};
pub use traversal::{Step, StepResult, Traversal, ENTRY};
pub use wireflow_checkpoint::{RunStack, SnapshotStore};
