//! The stepping algorithm: which node runs next, with which inputs
//!
//! A [`Traversal`] turns a [`GraphView`] into a restartable, lazily-produced,
//! possibly-infinite sequence of [`StepResult`]s. It is pull-based and owns
//! no threads: the host calls [`step`](Traversal::step) with the previous
//! result (outputs attached, if the node ran) and receives either the next
//! step or [`Step::Done`]. Everything a step needs to continue later rides
//! inside the `StepResult` itself, which is why pausing between two steps and
//! serializing the current result is all a checkpoint takes.
//!
//! # One Step
//!
//! ```text
//!   previous StepResult
//!   ┌──────────────────────────┐
//!   │ outputs (host-attached)  │──deliver──▶ EdgeLedger
//!   │ new_opportunities        │──append───▶ pending opportunities
//!   └──────────────────────────┘                  │
//!                                                 ▼ pop earliest (FIFO)
//!                                        destination node
//!                                                 │
//!                        ┌── required inputs missing? ──┐
//!                        ▼                              ▼
//!                   skip = true                 consume + resolve inputs
//!              (state untouched)           new_opportunities = outgoing edges
//! ```
//!
//! The FIFO pop makes execution order deterministic for a fixed graph and a
//! fixed sequence of host-provided outputs. Cycles need no special handling:
//! the next destination always comes from live opportunity data, never a
//! topological order, so a self-loop simply re-enqueues.
//!
//! # The `$entry` Pseudo-Step
//!
//! A fresh traversal begins with a synthetic step for the [`ENTRY`] node: it
//! is marked skipped, carries no inputs, and its pending opportunities are
//! one synthetic edge per entry node. Hosts therefore invoke only steps with
//! `skip == false` and never treat the entry marker specially.
//!
//! # Skipping
//!
//! A node whose required (non-optional, named-`in`) ports are not all
//! satisfied by queue heads, sticky values, or configuration keys is skipped:
//! no invocation, no consumption. The queued state stays put, so the node is
//! reconsidered whenever another opportunity delivers to it. A perpetually
//! skip-blocked node does not prevent termination.
//!
//! # Examples
//!
//! ```rust
//! use wireflow_core::{GraphDescriptor, GraphView, Step, Traversal};
//! use serde_json::{json, Map};
//!
//! let descriptor = GraphDescriptor::from_json_str(r#"{
//!     "nodes": [{"id": "a", "type": "seed"}, {"id": "b", "type": "show"}],
//!     "edges": [{"from": "a", "to": "b", "out": "x", "in": "y"}]
//! }"#).unwrap();
//!
//! let traversal = Traversal::new(GraphView::new(descriptor).unwrap());
//! let entry = traversal.start().unwrap();
//!
//! // First real step visits "a"; pretend the host invoked it.
//! let mut step = traversal.step(entry).unwrap().into_next().unwrap();
//! assert_eq!(step.node_id(), "a");
//! let mut outputs = Map::new();
//! outputs.insert("x".to_string(), json!(1));
//! step.provide_outputs(outputs);
//!
//! // The delivered value arrives on "b" under its input name.
//! let step = traversal.step(step).unwrap().into_next().unwrap();
//! assert_eq!(step.node_id(), "b");
//! assert_eq!(step.inputs["y"], json!(1));
//!
//! // "b" has no outgoing edges; the traversal is quiescent.
//! assert!(traversal.step(step).unwrap().is_done());
//! ```
//!
//! # See Also
//!
//! - [`EdgeLedger`] - Where delivered values wait
//! - [`Runner`](crate::Runner) - An opinionated async host loop over this API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use tracing::{debug, warn};
use wireflow_checkpoint::CheckpointError;

use crate::error::{Result, TraversalError};
use crate::graph::{Edge, GraphView, NodeDescriptor, PortName};
use crate::ledger::EdgeLedger;

/// Id and type of the synthetic node that seeds a fresh traversal
pub const ENTRY: &str = "$entry";

/// One step of a traversal
///
/// Immutable from the engine's point of view once emitted; the only mutation
/// a host performs is attaching the invoked node's outputs via
/// [`provide_outputs`](StepResult::provide_outputs) before asking for the
/// next step. A `StepResult` is plain serde data and doubles as the per-frame
/// state inside a checkpoint: resuming from a deserialized result is
/// indistinguishable from stepping the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// The node under consideration (the [`ENTRY`] pseudo-node on start)
    pub descriptor: NodeDescriptor,

    /// Resolved inputs: configuration with wired values laid over it
    ///
    /// Empty for skipped steps; available values stay queued.
    pub inputs: Map<String, Value>,

    /// Required input ports not yet satisfied, sorted and deduplicated
    ///
    /// Non-empty exactly when `skip` is true (except the entry pseudo-step,
    /// which is skipped with nothing missing).
    pub missing_inputs: Vec<PortName>,

    /// Opportunities still pending after this step was chosen, oldest first
    pub opportunities: VecDeque<Edge>,

    /// The node's outgoing edges, to be filled once its outputs exist
    pub new_opportunities: Vec<Edge>,

    /// Ledger snapshot after this step's consumption
    pub ledger: EdgeLedger,

    /// True when the node was not invoked this round
    pub skip: bool,

    /// Outputs attached by the host after invoking the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Map<String, Value>>,
}

impl StepResult {
    /// Attach the outputs produced by invoking this step's node
    pub fn provide_outputs(&mut self, outputs: Map<String, Value>) {
        self.outputs = Some(outputs);
    }

    /// Id of the node this step considers
    pub fn node_id(&self) -> &str {
        &self.descriptor.id
    }

    /// True for the synthetic step that seeds a fresh traversal
    pub fn is_entry(&self) -> bool {
        self.descriptor.id == ENTRY
    }
}

/// Outcome of advancing a traversal by one step
#[derive(Debug)]
pub enum Step {
    /// The traversal produced another step
    Next(StepResult),

    /// No opportunities remain; the run is quiescent
    Done,
}

impl Step {
    /// Unwrap the next step, if any
    pub fn into_next(self) -> Option<StepResult> {
        match self {
            Step::Next(result) => Some(result),
            Step::Done => None,
        }
    }

    /// True when the traversal has finished
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done)
    }
}

/// The stepping state machine over one [`GraphView`]
///
/// Holds only the immutable view; all mutable run state lives in the
/// [`StepResult`] passed through [`step`](Traversal::step) by value, which is
/// what makes ownership of the ledger exclusive and checkpoints trivial.
#[derive(Debug, Clone)]
pub struct Traversal {
    view: GraphView,
}

impl Traversal {
    /// Create a traversal over a validated view
    pub fn new(view: GraphView) -> Self {
        Self { view }
    }

    /// The view this traversal steps over
    pub fn view(&self) -> &GraphView {
        &self.view
    }

    /// Begin a fresh traversal
    ///
    /// Seeds one synthetic `$entry -> e` opportunity per entry node and
    /// returns the skipped [`ENTRY`] pseudo-step holding them.
    ///
    /// # Errors
    ///
    /// Returns [`TraversalError::NoEntryNodes`] when every node has at least
    /// one incoming edge.
    pub fn start(&self) -> Result<StepResult> {
        let entries = self.view.entries();
        if entries.is_empty() {
            return Err(TraversalError::NoEntryNodes);
        }
        debug!(entries = entries.len(), "traversal start");
        let opportunities = entries
            .iter()
            .map(|id| Edge::new(ENTRY, id.clone()))
            .collect();
        Ok(StepResult {
            descriptor: NodeDescriptor::new(ENTRY, ENTRY),
            inputs: Map::new(),
            missing_inputs: Vec::new(),
            opportunities,
            new_opportunities: Vec::new(),
            ledger: EdgeLedger::new(),
            skip: true,
            outputs: None,
        })
    }

    /// Validate a deserialized step against this traversal's view
    ///
    /// Stepping the returned result is indistinguishable from stepping the
    /// original, never-paused one.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckpointError::Corrupt`] wrapped in
    /// [`TraversalError::Checkpoint`] when the carried opportunities or
    /// ledger reference nodes this graph does not have.
    pub fn resume(&self, previous: StepResult) -> Result<StepResult> {
        self.ensure_known(&previous.descriptor.id)?;
        for edge in previous
            .opportunities
            .iter()
            .chain(previous.new_opportunities.iter())
        {
            self.ensure_known(&edge.from)?;
            self.ensure_known(&edge.to)?;
        }
        for id in previous.ledger.nodes() {
            self.ensure_known(id)?;
        }
        Ok(previous)
    }

    fn ensure_known(&self, id: &str) -> Result<()> {
        if id != ENTRY && !self.view.contains(id) {
            warn!(node = %id, "resumed state references unknown node");
            return Err(
                CheckpointError::corrupt(format!("state references unknown node '{id}'")).into(),
            );
        }
        Ok(())
    }

    /// Advance by one step
    ///
    /// Delivers the previous step's outputs along its outgoing edges, appends
    /// the newly discovered opportunities, then pops the earliest pending
    /// opportunity and evaluates its destination. Returns [`Step::Done`] when
    /// no opportunities remain.
    pub fn step(&self, previous: StepResult) -> Result<Step> {
        let StepResult {
            mut opportunities,
            new_opportunities,
            mut ledger,
            outputs,
            ..
        } = previous;

        let produced = outputs.unwrap_or_default();
        ledger.deliver(&new_opportunities, &produced);
        opportunities.extend(new_opportunities);

        let Some(opportunity) = opportunities.pop_front() else {
            debug!("traversal done");
            return Ok(Step::Done);
        };

        let descriptor = self
            .view
            .node(&opportunity.to)
            .cloned()
            .ok_or_else(|| {
                TraversalError::invalid_graph(format!(
                    "Opportunity references unknown node '{}'",
                    opportunity.to
                ))
            })?;

        let available = ledger.available_inputs(&descriptor.id);
        let missing = missing_inputs(self.view.incoming(&descriptor.id), &available, &descriptor);
        debug!(node = %descriptor.id, skip = !missing.is_empty(), "traversal step");

        if !missing.is_empty() {
            return Ok(Step::Next(StepResult {
                descriptor,
                inputs: Map::new(),
                missing_inputs: missing,
                opportunities,
                new_opportunities: Vec::new(),
                ledger,
                skip: true,
                outputs: None,
            }));
        }

        ledger.consume(&descriptor.id, &available);
        let inputs = merge_configuration(descriptor.configuration.as_ref(), available);
        let new_opportunities = self.view.outgoing(&descriptor.id).to_vec();
        Ok(Step::Next(StepResult {
            descriptor,
            inputs,
            missing_inputs: Vec::new(),
            opportunities,
            new_opportunities,
            ledger,
            skip: false,
            outputs: None,
        }))
    }
}

/// Required ports of `descriptor` not satisfied by wired values or
/// configuration keys, sorted and deduplicated
fn missing_inputs(
    incoming: &[Edge],
    available: &Map<String, Value>,
    descriptor: &NodeDescriptor,
) -> Vec<PortName> {
    let mut required: Vec<&str> = incoming
        .iter()
        .filter(|edge| !edge.optional)
        .filter_map(|edge| edge.input.as_deref())
        .collect();
    required.sort_unstable();
    required.dedup();

    let configured = descriptor.configuration.as_ref();
    required
        .into_iter()
        .filter(|port| !available.contains_key(*port))
        .filter(|port| !configured.is_some_and(|map| map.contains_key(*port)))
        .map(PortName::from)
        .collect()
}

/// Lay wired values over the node's configuration; wired wins on collisions
fn merge_configuration(
    configuration: Option<&Map<String, Value>>,
    wired: Map<String, Value>,
) -> Map<String, Value> {
    let Some(configuration) = configuration else {
        return wired;
    };
    let mut inputs = configuration.clone();
    for (key, value) in wired {
        inputs.insert(key, value);
    }
    inputs
}
