//! Opinionated async host loop over the traversal
//!
//! A [`Runner`] owns a [`GraphView`] and a [`NodeInvoker`] and drives the
//! pull-based [`Traversal`] to completion: it invokes nodes, feeds their
//! outputs back in, handles the well-known `input`/`output` node types,
//! descends into nested sub-graphs, reports progress through [`RunEvent`]s,
//! and persists a [`RunStack`] snapshot after every completed step when a
//! store is configured. Hosts that need finer control (substituting outputs
//! on failure, custom scheduling) drive the [`Traversal`] directly instead.
//!
//! # The Loop
//!
//! ```text
//!          ┌────────────────────────────────────────────────┐
//!          │                  Traversal                     │
//!          │   step(previous) ──▶ Step::Next / Step::Done   │
//!          └──────┬─────────────────────────────▲───────────┘
//!                 │ StepResult                  │ outputs attached
//!                 ▼                             │
//!          ┌────────────────────────────────────┴───────────┐
//!          │                   Runner                       │
//!          │  skip?          ──▶ Skip event, continue       │
//!          │  type "input"   ──▶ answers or pause           │
//!          │  type "output"  ──▶ record run outputs         │
//!          │  sub-graph type ──▶ nested run, inputs seeded  │
//!          │  anything else  ──▶ NodeInvoker::invoke        │
//!          └────────────────────────────────────────────────┘
//! ```
//!
//! # Well-Known Node Types
//!
//! - [`INPUT_TYPE`] (`"input"`): outputs come from the host, not the invoker.
//!   The first input node of the root graph consumes the configured initial
//!   inputs; with nothing to hand over, the run pauses and returns
//!   [`RunOutcome::AwaitingInput`] carrying a resumable snapshot. Inside a
//!   sub-graph, the first input node receives the values that were wired into
//!   the sub-graph node.
//! - [`OUTPUT_TYPE`] (`"output"`): resolved inputs are merged into the
//!   level's output map (later nodes win per key) and echoed as
//!   [`RunEvent::Output`]; the invoker is not called.
//!
//! # Sub-Graphs
//!
//! A node whose `type` matches a key of the descriptor's `graphs` map runs
//! that sub-graph as a nested invocation. The node's resolved inputs seed the
//! sub-run, and the sub-run's collected outputs become the node's outputs in
//! the parent. Pausing inside a sub-graph captures the whole frame stack
//! (suspended outer frames plus the active inner one), so resuming rebuilds
//! the nested runs outermost first.
//!
//! # Pausing, Resuming, Crash Recovery
//!
//! With a [`SnapshotStore`] configured, every completed step persists the
//! live [`RunStack`]. The persisted frame state includes the step's outputs,
//! so a process that crashed right after an expensive invocation resumes
//! without re-invoking it: [`Runner::resume`] sees the attached outputs and
//! advances past the node. Resumed levels re-emit `GraphStart` and
//! `NodeStart`, keeping the new process's event stream well formed on its
//! own.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::{json, Map};
//! use wireflow_core::{FnInvoker, GraphDescriptor, GraphView, RunConfig, RunOutcome, Runner};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let descriptor = GraphDescriptor::from_json_str(r#"{
//!     "nodes": [
//!         {"id": "ask", "type": "input"},
//!         {"id": "shout", "type": "upcase"},
//!         {"id": "answer", "type": "output"}
//!     ],
//!     "edges": [
//!         {"from": "ask", "to": "shout", "out": "text", "in": "text"},
//!         {"from": "shout", "to": "answer", "out": "text", "in": "text"}
//!     ]
//! }"#).unwrap();
//!
//! let invoker = FnInvoker::new(|_node, inputs| {
//!     let text = inputs["text"].as_str().unwrap_or_default().to_uppercase();
//!     let mut outputs = Map::new();
//!     outputs.insert("text".to_string(), json!(text));
//!     Ok(outputs)
//! });
//!
//! let mut inputs = Map::new();
//! inputs.insert("text".to_string(), json!("hello"));
//!
//! let runner = Runner::new(GraphView::new(descriptor).unwrap(), invoker)
//!     .with_config(RunConfig::new().with_inputs(inputs));
//!
//! match runner.run().await.unwrap() {
//!     RunOutcome::Completed { outputs } => assert_eq!(outputs["text"], json!("HELLO")),
//!     RunOutcome::AwaitingInput { .. } => unreachable!(),
//! }
//! # });
//! ```
//!
//! # See Also
//!
//! - [`Traversal`] - The stepping engine underneath this loop
//! - [`RunEvent`](crate::RunEvent) - The progress events a run emits
//! - [`SnapshotStore`] - Where snapshots go between processes

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wireflow_checkpoint::{CheckpointError, RunFrame, RunStack, SnapshotStore};

use crate::error::{Result, TraversalError};
use crate::events::{EventSender, RunEvent};
use crate::graph::{GraphView, NodeId};
use crate::invoker::NodeInvoker;
use crate::traversal::{Step, StepResult, Traversal};

/// Node type whose outputs come from the host instead of the invoker
pub const INPUT_TYPE: &str = "input";

/// Node type whose inputs are recorded as run outputs
pub const OUTPUT_TYPE: &str = "output";

/// Default bound on the number of steps a single `run`/`resume` call takes
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Configuration for one run
///
/// Built with chained `with_*` calls; everything is optional.
///
/// # Examples
///
/// ```rust
/// use serde_json::{json, Map};
/// use wireflow_core::RunConfig;
///
/// let mut inputs = Map::new();
/// inputs.insert("query".to_string(), json!("hello"));
///
/// let config = RunConfig::new()
///     .with_inputs(inputs)
///     .with_max_steps(500)
///     .with_run_id("run-42");
/// # let _ = config;
/// ```
#[derive(Clone)]
pub struct RunConfig {
    inputs: Map<String, Value>,
    max_steps: usize,
    events: Option<EventSender>,
    store: Option<Arc<dyn SnapshotStore>>,
    run_id: Option<String>,
}

impl RunConfig {
    /// Create a config with defaults: no inputs, no events, no store,
    /// [`DEFAULT_MAX_STEPS`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial input values
    ///
    /// They answer the root graph's first `input` node. An empty map counts
    /// as not provided.
    pub fn with_inputs(mut self, inputs: Map<String, Value>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Bound the number of steps one `run`/`resume` call may take
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Report progress through this channel; dropped receivers are ignored
    pub fn with_event_sender(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Persist a snapshot after every completed step
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a fixed run id instead of a fresh v4 UUID
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            inputs: Map::new(),
            max_steps: DEFAULT_MAX_STEPS,
            events: None,
            store: None,
            run_id: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("inputs", &self.inputs)
            .field("max_steps", &self.max_steps)
            .field("events", &self.events.is_some())
            .field("store", &self.store.is_some())
            .field("run_id", &self.run_id)
            .finish()
    }
}

/// How a `run`/`resume` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The traversal went quiescent; these are the collected run outputs
    Completed {
        /// Values recorded by the root graph's `output` nodes
        outputs: Map<String, Value>,
    },

    /// An `input` node had no answer; the run is parked in `snapshot`
    AwaitingInput {
        /// The input node that needs an answer
        node: NodeId,
        /// Everything needed to continue via [`Runner::resume`]
        snapshot: RunStack,
    },
}

impl RunOutcome {
    /// The collected outputs, if the run completed
    pub fn into_outputs(self) -> Option<Map<String, Value>> {
        match self {
            Self::Completed { outputs } => Some(outputs),
            Self::AwaitingInput { .. } => None,
        }
    }

    /// True when the run paused for input
    pub fn is_awaiting(&self) -> bool {
        matches!(self, Self::AwaitingInput { .. })
    }
}

/// The async host loop: traversal + invoker + run policy
pub struct Runner<I> {
    view: GraphView,
    invoker: I,
    config: RunConfig,
}

impl<I: NodeInvoker> Runner<I> {
    /// Create a runner over a validated view with default configuration
    pub fn new(view: GraphView, invoker: I) -> Self {
        Self {
            view,
            invoker,
            config: RunConfig::default(),
        }
    }

    /// Replace the run configuration
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// The view this runner executes
    pub fn view(&self) -> &GraphView {
        &self.view
    }

    /// Drive a fresh run to completion or to its first unanswered input
    ///
    /// # Errors
    ///
    /// Fails when the graph has no entry nodes, a node invocation fails, the
    /// step limit is exceeded, or snapshot persistence fails.
    pub async fn run(&self) -> Result<RunOutcome> {
        let run_id = self
            .config
            .run_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info!(run = %run_id, "run start");
        let seed = (!self.config.inputs.is_empty()).then(|| self.config.inputs.clone());
        let ctx = LevelContext {
            run_id: &run_id,
            url: self.view.descriptor().frame_url().to_string(),
            ancestors: Vec::new(),
        };
        let mut state = RunState { steps: 0 };
        let outcome = self
            .run_level(self.view.clone(), ctx, seed, None, &mut state)
            .await?;
        Ok(self.finish(&run_id, &state, outcome))
    }

    /// Continue a paused run from a snapshot
    ///
    /// `answers` become the outputs of the next `input` node encountered
    /// (the one that paused the run, when resuming an input pause). An empty
    /// map counts as not provided, so a run paused for input pauses again.
    ///
    /// # Errors
    ///
    /// Fails with a checkpoint error when the snapshot is structurally
    /// invalid or does not belong to this runner's graph, and with the same
    /// errors as [`run`](Runner::run) otherwise.
    pub async fn resume(
        &self,
        snapshot: &RunStack,
        answers: Map<String, Value>,
    ) -> Result<RunOutcome> {
        snapshot.validate()?;
        info!(run = %snapshot.run_id, depth = snapshot.depth(), "run resume");
        let level = split_frames(snapshot.frames.clone())?;
        let seed = (!answers.is_empty()).then_some(answers);
        let ctx = LevelContext {
            run_id: &snapshot.run_id,
            url: self.view.descriptor().frame_url().to_string(),
            ancestors: Vec::new(),
        };
        let mut state = RunState { steps: 0 };
        let outcome = self
            .run_level(self.view.clone(), ctx, seed, Some(level), &mut state)
            .await?;
        Ok(self.finish(&snapshot.run_id, &state, outcome))
    }

    fn finish(&self, run_id: &str, state: &RunState, outcome: LevelOutcome) -> RunOutcome {
        match outcome {
            LevelOutcome::Completed { outputs } => {
                info!(run = %run_id, steps = state.steps, "run complete");
                RunOutcome::Completed { outputs }
            }
            LevelOutcome::Await { node, stack } => {
                info!(run = %run_id, node = %node, steps = state.steps, "run awaiting input");
                RunOutcome::AwaitingInput {
                    node,
                    snapshot: stack,
                }
            }
        }
    }

    /// Execute one graph level, recursing for sub-graph nodes
    ///
    /// `ctx.ancestors` carries the suspended frames of every outer level, so
    /// a pause at any depth can assemble the full stack on the spot.
    fn run_level<'a>(
        &'a self,
        view: GraphView,
        ctx: LevelContext<'a>,
        seed: Option<Map<String, Value>>,
        resume: Option<LevelResume>,
        state: &'a mut RunState,
    ) -> BoxFuture<'a, Result<LevelOutcome>> {
        Box::pin(async move {
            let traversal = Traversal::new(view);
            let mut seed = seed;

            let (mut node_count, mut collected, mut carried, mut phase) = match resume {
                None => (0, Map::new(), None, Phase::Advance(traversal.start()?)),
                Some(LevelResume {
                    node_count,
                    state: blob,
                    children,
                }) => {
                    let FrameState { step, collected } =
                        serde_json::from_value(blob).map_err(|error| {
                            warn!(%error, "snapshot frame state does not decode");
                            CheckpointError::corrupt(format!("frame state does not decode: {error}"))
                        })?;
                    let step = traversal.resume(step)?;
                    let carried = (!children.is_empty()).then_some(children);
                    (node_count, collected, carried, Phase::Dispatch(step))
                }
            };

            debug!(url = %ctx.url, "graph level start");
            self.emit(RunEvent::GraphStart {
                url: ctx.url.clone(),
            });

            loop {
                phase = match phase {
                    Phase::Advance(step) => match traversal.step(step)? {
                        Step::Done => {
                            debug!(url = %ctx.url, node_count, "graph level complete");
                            self.emit(RunEvent::GraphEnd {
                                url: ctx.url.clone(),
                            });
                            return Ok(LevelOutcome::Completed { outputs: collected });
                        }
                        Step::Next(next) => {
                            state.steps += 1;
                            if state.steps > self.config.max_steps {
                                return Err(TraversalError::StepLimit(self.config.max_steps));
                            }
                            node_count += 1;
                            Phase::Dispatch(next)
                        }
                    },

                    Phase::Dispatch(mut step) => {
                        if step.is_entry() || step.outputs.is_some() {
                            // Entry pseudo-step, or a restored step whose
                            // invocation already completed before the snapshot.
                            if carried.is_some() {
                                return Err(stack_misfit(step.node_id()));
                            }
                            Phase::Advance(step)
                        } else if step.skip {
                            if carried.is_some() {
                                return Err(stack_misfit(step.node_id()));
                            }
                            self.emit(RunEvent::Skip {
                                node: step.node_id().to_string(),
                                missing: step.missing_inputs.clone(),
                            });
                            self.checkpoint(&ctx, node_count, &step, &collected).await?;
                            Phase::Advance(step)
                        } else {
                            let id = step.node_id().to_string();
                            let ty = step.descriptor.ty.clone();
                            self.emit(RunEvent::NodeStart {
                                node: id.clone(),
                                inputs: step.inputs.clone(),
                            });

                            let subgraph = if ty == INPUT_TYPE || ty == OUTPUT_TYPE {
                                None
                            } else {
                                traversal.view().subgraph(&ty).cloned()
                            };
                            if carried.is_some() && subgraph.is_none() {
                                return Err(stack_misfit(&id));
                            }

                            if ty == INPUT_TYPE {
                                match seed.take() {
                                    Some(answers) => {
                                        self.emit(RunEvent::NodeEnd {
                                            node: id,
                                            outputs: answers.clone(),
                                        });
                                        step.provide_outputs(answers);
                                        self.checkpoint(&ctx, node_count, &step, &collected)
                                            .await?;
                                        Phase::Advance(step)
                                    }
                                    None => {
                                        debug!(node = %id, "pausing for input");
                                        self.emit(RunEvent::InputRequired { node: id.clone() });
                                        let stack = active_stack(
                                            ctx.run_id,
                                            &ctx.ancestors,
                                            &ctx.url,
                                            node_count,
                                            &step,
                                            &collected,
                                        )?;
                                        if let Some(store) = &self.config.store {
                                            store.put(&stack).await?;
                                        }
                                        return Ok(LevelOutcome::Await { node: id, stack });
                                    }
                                }
                            } else if ty == OUTPUT_TYPE {
                                for (key, value) in step.inputs.clone() {
                                    collected.insert(key, value);
                                }
                                self.emit(RunEvent::Output {
                                    node: id.clone(),
                                    outputs: step.inputs.clone(),
                                });
                                self.emit(RunEvent::NodeEnd {
                                    node: id,
                                    outputs: Map::new(),
                                });
                                step.provide_outputs(Map::new());
                                self.checkpoint(&ctx, node_count, &step, &collected).await?;
                                Phase::Advance(step)
                            } else if let Some(sub) = subgraph {
                                let sub_url = format!("{}#{}", ctx.url, ty);
                                debug!(parent = %ctx.url, sub = %sub_url, node = %id, "entering sub-graph");
                                let sub_view = GraphView::from_arc(Arc::new(sub))?;
                                let mut sub_ancestors = ctx.ancestors.clone();
                                sub_ancestors.push(RunFrame::suspended(
                                    ctx.url.clone(),
                                    node_count,
                                    frame_state(&step, &collected)?,
                                    Value::Object(step.inputs.clone()),
                                ));
                                let (sub_seed, sub_resume) = match carried.take() {
                                    Some(frames) => (seed.take(), Some(split_frames(frames)?)),
                                    None => (Some(step.inputs.clone()), None),
                                };
                                let sub_ctx = LevelContext {
                                    run_id: ctx.run_id,
                                    url: sub_url,
                                    ancestors: sub_ancestors,
                                };
                                match self
                                    .run_level(sub_view, sub_ctx, sub_seed, sub_resume, state)
                                    .await?
                                {
                                    LevelOutcome::Completed { outputs } => {
                                        self.emit(RunEvent::NodeEnd {
                                            node: id,
                                            outputs: outputs.clone(),
                                        });
                                        step.provide_outputs(outputs);
                                        self.checkpoint(&ctx, node_count, &step, &collected)
                                            .await?;
                                        Phase::Advance(step)
                                    }
                                    suspended @ LevelOutcome::Await { .. } => {
                                        return Ok(suspended);
                                    }
                                }
                            } else {
                                match self
                                    .invoker
                                    .invoke(&step.descriptor, step.inputs.clone())
                                    .await
                                {
                                    Ok(outputs) => {
                                        self.emit(RunEvent::NodeEnd {
                                            node: id,
                                            outputs: outputs.clone(),
                                        });
                                        step.provide_outputs(outputs);
                                        self.checkpoint(&ctx, node_count, &step, &collected)
                                            .await?;
                                        Phase::Advance(step)
                                    }
                                    Err(error) => {
                                        warn!(node = %id, error = %error, "node invocation failed");
                                        self.emit(RunEvent::Error {
                                            node: id,
                                            message: error.to_string(),
                                        });
                                        return Err(error);
                                    }
                                }
                            }
                        }
                    }
                };
            }
        })
    }

    async fn checkpoint(
        &self,
        ctx: &LevelContext<'_>,
        node_count: u64,
        step: &StepResult,
        collected: &Map<String, Value>,
    ) -> Result<()> {
        let Some(store) = &self.config.store else {
            return Ok(());
        };
        let stack = active_stack(
            ctx.run_id,
            &ctx.ancestors,
            &ctx.url,
            node_count,
            step,
            collected,
        )?;
        store.put(&stack).await?;
        Ok(())
    }

    fn emit(&self, event: RunEvent) {
        if let Some(events) = &self.config.events {
            let _ = events.send(event);
        }
    }
}

/// Where the loop is between two operations on one step
enum Phase {
    /// Feed the previous result back into the traversal
    Advance(StepResult),
    /// Act on a freshly produced (or restored) step
    Dispatch(StepResult),
}

/// Per-level immutable context threaded through the recursion
struct LevelContext<'r> {
    run_id: &'r str,
    url: String,
    ancestors: Vec<RunFrame>,
}

/// The part of a snapshot addressed to one level: its own frame plus the
/// frames of the levels nested inside it
struct LevelResume {
    node_count: u64,
    state: Value,
    children: Vec<RunFrame>,
}

/// How one level ended
enum LevelOutcome {
    Completed { outputs: Map<String, Value> },
    Await { node: NodeId, stack: RunStack },
}

/// Counters shared by every level of one run
struct RunState {
    steps: usize,
}

/// Engine-private payload of a frame's `state` blob
#[derive(Debug, Serialize, Deserialize)]
struct FrameState {
    step: StepResult,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    collected: Map<String, Value>,
}

fn frame_state(step: &StepResult, collected: &Map<String, Value>) -> Result<Value> {
    Ok(serde_json::to_value(FrameState {
        step: step.clone(),
        collected: collected.clone(),
    })?)
}

fn active_stack(
    run_id: &str,
    ancestors: &[RunFrame],
    url: &str,
    node_count: u64,
    step: &StepResult,
    collected: &Map<String, Value>,
) -> Result<RunStack> {
    let mut frames = ancestors.to_vec();
    frames.push(RunFrame::active(
        url,
        node_count,
        frame_state(step, collected)?,
    ));
    Ok(RunStack::new(run_id).with_frames(frames))
}

/// Reject a snapshot whose suspended frames sit behind a step that cannot
/// have a nested invocation in flight
fn stack_misfit(node: &str) -> TraversalError {
    warn!(node = %node, "suspended frames continue through a non-sub-graph node");
    CheckpointError::corrupt(format!(
        "suspended frames continue through non-sub-graph node '{node}'"
    ))
    .into()
}

/// Peel a frame list into the outermost level's share and its children
fn split_frames(mut frames: Vec<RunFrame>) -> Result<LevelResume> {
    if frames.is_empty() {
        return Err(CheckpointError::corrupt("snapshot has no frames").into());
    }
    let first = frames.remove(0);
    Ok(LevelResume {
        node_count: first.node_count(),
        state: first.state().clone(),
        children: frames,
    })
}
