//! Graph descriptor model and the read-only view used by traversal
//!
//! This module defines the wire format for graphs ([`GraphDescriptor`],
//! [`NodeDescriptor`], [`Edge`]) and the precomputed lookup structure built
//! from it ([`GraphView`]). Descriptors are plain serde data produced by an
//! external editor or written by hand; the engine never mutates one in place.
//! A new edit produces a new descriptor and a new view.
//!
//! # Wiring Model
//!
//! ```text
//! ┌────────┐  out: "text"        in: "prompt"  ┌────────┐
//! │ fetch  │ ────────────────────────────────▶ │ render │
//! └────────┘                                   └────────┘
//!      │                                            ▲
//!      │  out: "*"  (every output key fans out      │
//!      └──────────── to the same-named input) ──────┘
//! ```
//!
//! Each edge names an output port on `from` and an input port on `to`:
//!
//! - `out: "x", in: "y"` routes the value produced under `x` to input `y`.
//! - `out: "*"` (or `out` absent) fans every produced output key to the
//!   same-named input key on `to`.
//! - A named `out` with no `in` delivers nothing: the edge only creates an
//!   execution opportunity for `to` (pure sequencing).
//! - `optional` edges do not count toward a node's required inputs.
//! - `constant` edges deliver into a sticky slot that survives consumption;
//!   see [`EdgeLedger`](crate::EdgeLedger).
//!
//! Duplicate edges are allowed and additive: two identical wires deliver two
//! queued values.
//!
//! # Examples
//!
//! ```rust
//! use wireflow_core::{GraphDescriptor, GraphView};
//!
//! let descriptor = GraphDescriptor::from_json_str(r#"{
//!     "nodes": [
//!         {"id": "ask", "type": "input"},
//!         {"id": "answer", "type": "output"}
//!     ],
//!     "edges": [
//!         {"from": "ask", "to": "answer", "out": "text", "in": "text"}
//!     ]
//! }"#).unwrap();
//!
//! let view = GraphView::new(descriptor).unwrap();
//! assert_eq!(view.entries(), ["ask"]);
//! assert_eq!(view.outgoing("ask").len(), 1);
//! assert_eq!(view.incoming("answer").len(), 1);
//! ```
//!
//! # See Also
//!
//! - [`Traversal`](crate::Traversal) - Steps over a [`GraphView`]
//! - [`EdgeLedger`](crate::EdgeLedger) - Holds values in flight along edges

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, TraversalError};

/// Node identifier, unique within one graph
///
/// Sub-graphs each have their own id namespace.
pub type NodeId = String;

/// Name of an input or output port on a node
pub type PortName = String;

/// Wildcard output port: fans every produced output key to the same-named
/// input key on the destination node
pub const WILDCARD: &str = "*";

/// A wire between two nodes
///
/// Serialized field names are exactly `from`, `to`, `out`, `in`, `optional`,
/// `constant`; the two flags default to false and are omitted when false.
///
/// # Examples
///
/// ```rust
/// use wireflow_core::Edge;
///
/// let edge = Edge::wired("a", "b", "x", "y");
/// assert_eq!(serde_json::to_string(&edge).unwrap(),
///            r#"{"from":"a","to":"b","out":"x","in":"y"}"#);
///
/// let sticky = Edge::wired("a", "b", "x", "y").constant();
/// assert!(sticky.constant);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id
    pub from: NodeId,

    /// Destination node id
    pub to: NodeId,

    /// Output port on `from`; `"*"` or absent means every output key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<PortName>,

    /// Input port on `to`; absent (with a named `out`) means the edge
    /// sequences execution without delivering a value
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PortName>,

    /// Optional edges do not count toward the destination's required inputs
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,

    /// Constant edges deliver into a sticky slot instead of a queue
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub constant: bool,
}

impl Edge {
    /// Create an edge with no ports (wildcard fan-out)
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            out: None,
            input: None,
            optional: false,
            constant: false,
        }
    }

    /// Create an edge routing output port `out` to input port `input`
    pub fn wired(
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        out: impl Into<PortName>,
        input: impl Into<PortName>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            out: Some(out.into()),
            input: Some(input.into()),
            optional: false,
            constant: false,
        }
    }

    /// Mark this edge optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark this edge constant (sticky delivery)
    pub fn constant(mut self) -> Self {
        self.constant = true;
        self
    }

    /// True when this edge fans every output key to same-named inputs
    ///
    /// Wildcard status depends only on `out`: either the explicit `"*"` port
    /// or no `out` at all.
    pub fn is_wildcard(&self) -> bool {
        match &self.out {
            Some(out) => out == WILDCARD,
            None => true,
        }
    }

    /// True when this edge creates an opportunity but delivers no value
    pub fn is_sequencing(&self) -> bool {
        !self.is_wildcard() && self.input.is_none()
    }
}

/// A node in a graph
///
/// `type` selects the behavior (the host's invoker dispatches on it, and the
/// well-known `input`/`output` types are handled by the
/// [`Runner`](crate::Runner)). `configuration` participates in input
/// resolution: resolved step inputs are the configuration with wired values
/// laid over it, and configuration keys satisfy required inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Unique id of the node within its graph
    pub id: NodeId,

    /// Type of the node, used to look up its behavior
    #[serde(rename = "type")]
    pub ty: String,

    /// Static configuration merged under wired inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Map<String, Value>>,
}

impl NodeDescriptor {
    /// Create a node descriptor with no configuration
    pub fn new(id: impl Into<NodeId>, ty: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ty: ty.into(),
            configuration: None,
        }
    }

    /// Attach configuration values
    pub fn with_configuration(mut self, configuration: Map<String, Value>) -> Self {
        self.configuration = Some(configuration);
        self
    }
}

/// A complete graph: nodes, edges, and optional nested sub-graphs
///
/// This is the on-disk/on-wire board format. The metadata fields are all
/// optional and omitted when absent; `url` labels checkpoint frames, and a
/// sub-graph's effective url is `<parent-url>#<key>`.
///
/// # Examples
///
/// ## Loading From YAML
///
/// ```rust
/// use wireflow_core::GraphDescriptor;
///
/// let descriptor = GraphDescriptor::from_yaml_str(r#"
/// title: Echo
/// nodes:
///   - id: ask
///     type: input
///   - id: answer
///     type: output
/// edges:
///   - from: ask
///     to: answer
///     out: text
///     in: text
/// "#).unwrap();
///
/// assert_eq!(descriptor.title.as_deref(), Some("Echo"));
/// assert_eq!(descriptor.nodes.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDescriptor {
    /// Location this graph was loaded from; labels checkpoint frames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Longer description of what the graph does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version label of the graph, not interpreted by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Nodes, in declaration order
    pub nodes: Vec<NodeDescriptor>,

    /// Wires between nodes; duplicates are additive
    pub edges: Vec<Edge>,

    /// Nested sub-graphs, addressed by id
    ///
    /// A node whose `type` equals a key here runs that sub-graph as a nested
    /// invocation instead of going through the invoker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphs: Option<HashMap<String, GraphDescriptor>>,
}

impl GraphDescriptor {
    /// Parse a descriptor from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a descriptor from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// The url used to label this graph's checkpoint frames
    ///
    /// Empty when the descriptor carries no `url`.
    pub fn frame_url(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }
}

/// Read-only precomputed view over a [`GraphDescriptor`]
///
/// Built once per descriptor in O(nodes + edges): node lookup by id,
/// incoming/outgoing adjacency, and the entry set (nodes with zero incoming
/// edges, in descriptor order). Construction fails with
/// [`TraversalError::InvalidGraph`] when an edge references an unknown node
/// id or two nodes share an id.
///
/// The view retains the descriptor behind an [`Arc`], so cloning a view is
/// cheap and sub-graph lookups remain possible for the view's lifetime.
#[derive(Debug, Clone)]
pub struct GraphView {
    descriptor: Arc<GraphDescriptor>,
    node_index: HashMap<NodeId, usize>,
    incoming: HashMap<NodeId, Vec<Edge>>,
    outgoing: HashMap<NodeId, Vec<Edge>>,
    entries: Vec<NodeId>,
}

impl GraphView {
    /// Build a view, validating the descriptor's structure
    ///
    /// # Errors
    ///
    /// Returns [`TraversalError::InvalidGraph`] if two nodes share an id or
    /// an edge endpoint references a node that does not exist.
    pub fn new(descriptor: GraphDescriptor) -> Result<Self> {
        Self::from_arc(Arc::new(descriptor))
    }

    /// Build a view over an already-shared descriptor
    pub fn from_arc(descriptor: Arc<GraphDescriptor>) -> Result<Self> {
        let mut node_index = HashMap::with_capacity(descriptor.nodes.len());
        for (index, node) in descriptor.nodes.iter().enumerate() {
            if node_index.insert(node.id.clone(), index).is_some() {
                return Err(TraversalError::invalid_graph(format!(
                    "Duplicate node id '{}'",
                    node.id
                )));
            }
        }

        let mut incoming: HashMap<NodeId, Vec<Edge>> = HashMap::new();
        let mut outgoing: HashMap<NodeId, Vec<Edge>> = HashMap::new();
        for edge in &descriptor.edges {
            if !node_index.contains_key(&edge.from) {
                return Err(TraversalError::invalid_graph(format!(
                    "Edge to '{}' references unknown node '{}'",
                    edge.to, edge.from
                )));
            }
            if !node_index.contains_key(&edge.to) {
                return Err(TraversalError::invalid_graph(format!(
                    "Edge from '{}' references unknown node '{}'",
                    edge.from, edge.to
                )));
            }
            outgoing
                .entry(edge.from.clone())
                .or_default()
                .push(edge.clone());
            incoming
                .entry(edge.to.clone())
                .or_default()
                .push(edge.clone());
        }

        let entries = descriptor
            .nodes
            .iter()
            .filter(|node| !incoming.contains_key(&node.id))
            .map(|node| node.id.clone())
            .collect();

        Ok(Self {
            descriptor,
            node_index,
            incoming,
            outgoing,
            entries,
        })
    }

    /// Nodes with no incoming edges, in descriptor order
    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    /// Edges arriving at `id`, in declaration order
    ///
    /// Unknown ids yield an empty slice.
    pub fn incoming(&self, id: &str) -> &[Edge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Edges leaving `id`, in declaration order
    pub fn outgoing(&self, id: &str) -> &[Edge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Look up a node descriptor by id
    pub fn node(&self, id: &str) -> Option<&NodeDescriptor> {
        self.node_index
            .get(id)
            .map(|&index| &self.descriptor.nodes[index])
    }

    /// True when `id` names a node of this graph
    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// The underlying descriptor
    pub fn descriptor(&self) -> &GraphDescriptor {
        &self.descriptor
    }

    /// Look up a nested sub-graph by its `graphs` key
    pub fn subgraph(&self, key: &str) -> Option<&GraphDescriptor> {
        self.descriptor.graphs.as_ref()?.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_node_descriptor() -> GraphDescriptor {
        GraphDescriptor {
            nodes: vec![
                NodeDescriptor::new("a", "start"),
                NodeDescriptor::new("b", "finish"),
            ],
            edges: vec![Edge::wired("a", "b", "x", "y")],
            ..Default::default()
        }
    }

    #[test]
    fn test_edge_wire_format_omits_default_flags() {
        let edge = Edge::wired("a", "b", "x", "y");
        let text = serde_json::to_string(&edge).unwrap();
        assert_eq!(text, r#"{"from":"a","to":"b","out":"x","in":"y"}"#);

        let sticky = Edge::wired("a", "b", "x", "y").constant().optional();
        let value = serde_json::to_value(&sticky).unwrap();
        assert_eq!(value["optional"], json!(true));
        assert_eq!(value["constant"], json!(true));
    }

    #[test]
    fn test_edge_in_field_round_trips() {
        let parsed: Edge =
            serde_json::from_str(r#"{"from":"a","to":"b","out":"x","in":"y"}"#).unwrap();
        assert_eq!(parsed.input.as_deref(), Some("y"));
        assert_eq!(parsed, Edge::wired("a", "b", "x", "y"));
    }

    #[test]
    fn test_edge_kind_predicates() {
        assert!(Edge::new("a", "b").is_wildcard());
        assert!(!Edge::new("a", "b").is_sequencing());

        let star = Edge {
            out: Some(WILDCARD.to_string()),
            ..Edge::new("a", "b")
        };
        assert!(star.is_wildcard());

        let sequencing = Edge {
            out: Some("done".to_string()),
            ..Edge::new("a", "b")
        };
        assert!(sequencing.is_sequencing());
        assert!(!sequencing.is_wildcard());

        assert!(!Edge::wired("a", "b", "x", "y").is_wildcard());
        assert!(!Edge::wired("a", "b", "x", "y").is_sequencing());
    }

    #[test]
    fn test_descriptor_from_json() {
        let descriptor = GraphDescriptor::from_json_str(
            r#"{
                "url": "boards/echo.json",
                "title": "Echo",
                "nodes": [{"id": "n", "type": "noop", "configuration": {"greeting": "hi"}}],
                "edges": []
            }"#,
        )
        .unwrap();
        assert_eq!(descriptor.frame_url(), "boards/echo.json");
        assert_eq!(descriptor.nodes[0].ty, "noop");
        let configuration = descriptor.nodes[0].configuration.as_ref().unwrap();
        assert_eq!(configuration["greeting"], json!("hi"));
    }

    #[test]
    fn test_descriptor_from_yaml() {
        let descriptor = GraphDescriptor::from_yaml_str(
            "nodes:\n  - id: a\n    type: start\nedges:\n  - from: a\n    to: a\n    constant: true\n",
        )
        .unwrap();
        assert_eq!(descriptor.nodes.len(), 1);
        assert!(descriptor.edges[0].constant);
        assert_eq!(descriptor.frame_url(), "");
    }

    #[test]
    fn test_descriptor_with_subgraphs() {
        let descriptor = GraphDescriptor::from_json_str(
            r#"{
                "nodes": [{"id": "outer", "type": "sub"}],
                "edges": [],
                "graphs": {
                    "sub": {"nodes": [{"id": "inner", "type": "noop"}], "edges": []}
                }
            }"#,
        )
        .unwrap();
        let view = GraphView::new(descriptor).unwrap();
        let sub = view.subgraph("sub").unwrap();
        assert_eq!(sub.nodes[0].id, "inner");
        assert!(view.subgraph("absent").is_none());
    }

    #[test]
    fn test_view_adjacency_and_entries() {
        let view = GraphView::new(two_node_descriptor()).unwrap();
        assert_eq!(view.entries(), ["a"]);
        assert_eq!(view.outgoing("a").len(), 1);
        assert_eq!(view.incoming("b").len(), 1);
        assert!(view.incoming("a").is_empty());
        assert!(view.outgoing("b").is_empty());
        assert_eq!(view.node("b").unwrap().ty, "finish");
        assert!(view.node("zzz").is_none());
    }

    #[test]
    fn test_entries_preserve_descriptor_order() {
        let descriptor = GraphDescriptor {
            nodes: vec![
                NodeDescriptor::new("late", "noop"),
                NodeDescriptor::new("early", "noop"),
                NodeDescriptor::new("wired", "noop"),
            ],
            edges: vec![Edge::wired("late", "wired", "x", "y")],
            ..Default::default()
        };
        let view = GraphView::new(descriptor).unwrap();
        assert_eq!(view.entries(), ["late", "early"]);
    }

    #[test]
    fn test_duplicate_node_id_rejected() {
        let descriptor = GraphDescriptor {
            nodes: vec![
                NodeDescriptor::new("a", "noop"),
                NodeDescriptor::new("a", "noop"),
            ],
            edges: vec![],
            ..Default::default()
        };
        let err = GraphView::new(descriptor).unwrap_err();
        assert!(matches!(err, TraversalError::InvalidGraph(_)));
        assert!(err.to_string().contains("Duplicate node id 'a'"));
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let mut descriptor = two_node_descriptor();
        descriptor.edges.push(Edge::wired("b", "ghost", "x", "y"));
        let err = GraphView::new(descriptor).unwrap_err();
        assert!(err.to_string().contains("ghost"));

        let mut descriptor = two_node_descriptor();
        descriptor.edges.push(Edge::wired("ghost", "a", "x", "y"));
        assert!(GraphView::new(descriptor).is_err());
    }

    #[test]
    fn test_self_loop_is_valid() {
        let descriptor = GraphDescriptor {
            nodes: vec![NodeDescriptor::new("loop", "accumulate")],
            edges: vec![Edge::wired("loop", "loop", "memory", "memory").constant()],
            ..Default::default()
        };
        let view = GraphView::new(descriptor).unwrap();
        // A self-wired node has an incoming edge, so it is not an entry.
        assert!(view.entries().is_empty());
        assert_eq!(view.incoming("loop"), view.outgoing("loop"));
    }

    #[test]
    fn test_duplicate_edges_are_kept() {
        let mut descriptor = two_node_descriptor();
        descriptor.edges.push(Edge::wired("a", "b", "x", "y"));
        let view = GraphView::new(descriptor).unwrap();
        assert_eq!(view.outgoing("a").len(), 2);
        assert_eq!(view.incoming("b").len(), 2);
    }
}
