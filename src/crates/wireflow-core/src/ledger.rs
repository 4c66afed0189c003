//! Per-run storage for values in flight along edges
//!
//! The [`EdgeLedger`] holds everything a run has produced but not yet
//! consumed, keyed by (destination node, destination port). Ordinary edges
//! feed FIFO queues: each delivered value is consumed exactly once, in
//! delivery order. Constant edges feed a separate sticky store: a sticky
//! value survives consumption and remains visible to every future visit of
//! the destination until a later delivery on the same edge overwrites it.
//!
//! ```text
//!              deliver                       available_inputs
//!  outputs ──────────────▶  queues[to][in]  ───────────┐
//!                           (FIFO, pop on consume)     ├──▶ {port: value}
//!  outputs ──────────────▶  sticky[to][in]  ───────────┘
//!           (constant edge) (overwrite, never popped)
//! ```
//!
//! Reading and removing are deliberately separate operations:
//! [`available_inputs`](EdgeLedger::available_inputs) peeks without side
//! effects so the traversal can check readiness before committing, and
//! [`consume`](EdgeLedger::consume) pops only what a step actually used.
//! That split is what lets constants be read repeatedly across cycles, e.g. a
//! running-memory node that wires its own output back to its own input.
//!
//! A ledger is exclusively owned by one traversal; it is plain serde data and
//! serializes as part of every checkpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use tracing::trace;

use crate::graph::{Edge, NodeId, PortName};

/// Pending values for every (destination node, destination port) pair
///
/// # Examples
///
/// ```rust
/// use wireflow_core::{Edge, EdgeLedger};
/// use serde_json::{json, Map};
///
/// let mut ledger = EdgeLedger::new();
/// let wire = [Edge::wired("a", "b", "x", "y")];
///
/// let mut outputs = Map::new();
/// outputs.insert("x".to_string(), json!(1));
/// ledger.deliver(&wire, &outputs);
///
/// let available = ledger.available_inputs("b");
/// assert_eq!(available["y"], json!(1));
///
/// ledger.consume("b", &available);
/// assert!(ledger.available_inputs("b").is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeLedger {
    /// FIFO queues of undelivered values, keyed by destination node then port
    queues: HashMap<NodeId, HashMap<PortName, VecDeque<Value>>>,

    /// Sticky values from constant edges, keyed the same way
    sticky: HashMap<NodeId, HashMap<PortName, Value>>,
}

impl EdgeLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `outputs` along the given opportunity edges
    ///
    /// For each edge whose `out` key is present in `outputs` (or, for a
    /// wildcard edge, every output key), the mapped value is either written
    /// to the sticky slot (`constant` edges, overwriting) or appended to the
    /// FIFO queue for its (to, in) pair. Sequencing edges deliver nothing.
    /// Duplicate edges deliver twice.
    pub fn deliver(&mut self, opportunities: &[Edge], outputs: &Map<String, Value>) {
        for edge in opportunities {
            if edge.is_wildcard() {
                for (port, value) in outputs {
                    self.route(edge, port, value.clone());
                }
                continue;
            }
            let Some(out) = edge.out.as_deref() else {
                continue;
            };
            let Some(port) = edge.input.as_deref() else {
                continue;
            };
            if let Some(value) = outputs.get(out) {
                self.route(edge, port, value.clone());
            }
        }
    }

    fn route(&mut self, edge: &Edge, port: &str, value: Value) {
        trace!(
            node = %edge.to,
            port = %port,
            constant = edge.constant,
            "ledger delivery"
        );
        if edge.constant {
            self.sticky
                .entry(edge.to.clone())
                .or_default()
                .insert(port.to_string(), value);
        } else {
            self.queues
                .entry(edge.to.clone())
                .or_default()
                .entry(port.to_string())
                .or_default()
                .push_back(value);
        }
    }

    /// Values currently readable by node `id`, one per port
    ///
    /// The union of every sticky value for the node and every queue's head.
    /// When both exist for the same port, the queue head wins; the sticky
    /// value becomes visible again once the queue drains. Pure peek, no state
    /// changes.
    pub fn available_inputs(&self, id: &str) -> Map<String, Value> {
        let mut available = Map::new();
        if let Some(slots) = self.sticky.get(id) {
            for (port, value) in slots {
                available.insert(port.clone(), value.clone());
            }
        }
        if let Some(queues) = self.queues.get(id) {
            for (port, queue) in queues {
                if let Some(head) = queue.front() {
                    available.insert(port.clone(), head.clone());
                }
            }
        }
        available
    }

    /// Node ids that currently hold queued or sticky values
    ///
    /// Used when resuming to check that a restored ledger only references
    /// nodes the graph still has.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.queues.keys().chain(self.sticky.keys())
    }

    /// Remove the queued values a step actually used
    ///
    /// For every port in `used` whose value is not currently the node's
    /// sticky value for that port, one element is popped from the port's
    /// queue. Sticky-backed values are left in place, which is what keeps
    /// constants alive across cycles. Ports not mentioned in `used` are
    /// untouched.
    pub fn consume(&mut self, id: &str, used: &Map<String, Value>) {
        let Some(queues) = self.queues.get_mut(id) else {
            return;
        };
        for (port, value) in used {
            let sticky_backed = self
                .sticky
                .get(id)
                .and_then(|slots| slots.get(port))
                .is_some_and(|sticky| sticky == value);
            if sticky_backed {
                continue;
            }
            if let Some(queue) = queues.get_mut(port) {
                queue.pop_front();
                trace!(node = %id, port = %port, "ledger consumption");
                if queue.is_empty() {
                    queues.remove(port);
                }
            }
        }
        if queues.is_empty() {
            self.queues.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outputs_of(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_deliver_consume_is_fifo() {
        let mut ledger = EdgeLedger::new();
        let wire = [Edge::wired("a", "b", "x", "y")];

        ledger.deliver(&wire, &outputs_of(&[("x", json!("first"))]));
        ledger.deliver(&wire, &outputs_of(&[("x", json!("second"))]));

        let available = ledger.available_inputs("b");
        assert_eq!(available["y"], json!("first"));

        ledger.consume("b", &available);
        let available = ledger.available_inputs("b");
        assert_eq!(available["y"], json!("second"));

        ledger.consume("b", &available);
        assert!(ledger.available_inputs("b").is_empty());
    }

    #[test]
    fn test_constant_value_survives_consumption() {
        let mut ledger = EdgeLedger::new();
        let wire = [Edge::wired("a", "b", "x", "ctx").constant()];

        ledger.deliver(&wire, &outputs_of(&[("x", json!("hello"))]));

        for _ in 0..3 {
            let available = ledger.available_inputs("b");
            assert_eq!(available["ctx"], json!("hello"));
            ledger.consume("b", &available);
        }

        // A later delivery on the same constant edge overwrites the slot.
        ledger.deliver(&wire, &outputs_of(&[("x", json!("replaced"))]));
        assert_eq!(ledger.available_inputs("b")["ctx"], json!("replaced"));
    }

    #[test]
    fn test_queue_head_shadows_sticky_until_drained() {
        let mut ledger = EdgeLedger::new();
        let constant = [Edge::wired("a", "b", "c1", "ctx").constant()];
        let queued = [Edge::wired("a", "b", "c2", "ctx")];

        ledger.deliver(&constant, &outputs_of(&[("c1", json!("hello"))]));
        ledger.deliver(&queued, &outputs_of(&[("c2", json!("world"))]));

        let available = ledger.available_inputs("b");
        assert_eq!(available["ctx"], json!("world"));

        ledger.consume("b", &available);
        // Queue drained; the constant never vanished.
        assert_eq!(ledger.available_inputs("b")["ctx"], json!("hello"));
    }

    #[test]
    fn test_consume_skips_sticky_matched_values() {
        let mut ledger = EdgeLedger::new();
        let constant = [Edge::wired("a", "b", "x", "ctx").constant()];

        ledger.deliver(&constant, &outputs_of(&[("x", json!("same"))]));

        let available = ledger.available_inputs("b");
        ledger.consume("b", &available);
        ledger.consume("b", &available);
        assert_eq!(ledger.available_inputs("b")["ctx"], json!("same"));
    }

    #[test]
    fn test_wildcard_fans_all_output_keys() {
        let mut ledger = EdgeLedger::new();
        let star = [Edge::new("a", "b")];

        ledger.deliver(&star, &outputs_of(&[("left", json!(1)), ("right", json!(2))]));

        let available = ledger.available_inputs("b");
        assert_eq!(available["left"], json!(1));
        assert_eq!(available["right"], json!(2));
    }

    #[test]
    fn test_wildcard_constant_sticks_every_key() {
        let mut ledger = EdgeLedger::new();
        let star = [Edge::new("a", "b").constant()];

        ledger.deliver(&star, &outputs_of(&[("left", json!(1)), ("right", json!(2))]));
        let available = ledger.available_inputs("b");
        ledger.consume("b", &available);

        let again = ledger.available_inputs("b");
        assert_eq!(again["left"], json!(1));
        assert_eq!(again["right"], json!(2));
    }

    #[test]
    fn test_sequencing_edge_delivers_nothing() {
        let mut ledger = EdgeLedger::new();
        let sequencing = [Edge {
            out: Some("done".to_string()),
            ..Edge::new("a", "b")
        }];

        ledger.deliver(&sequencing, &outputs_of(&[("done", json!(true))]));
        assert!(ledger.available_inputs("b").is_empty());
    }

    #[test]
    fn test_unmatched_output_key_delivers_nothing() {
        let mut ledger = EdgeLedger::new();
        let wire = [Edge::wired("a", "b", "x", "y")];

        ledger.deliver(&wire, &outputs_of(&[("other", json!(1))]));
        assert!(ledger.available_inputs("b").is_empty());
    }

    #[test]
    fn test_duplicate_edges_deliver_twice() {
        let mut ledger = EdgeLedger::new();
        let wires = [
            Edge::wired("a", "b", "x", "y"),
            Edge::wired("a", "b", "x", "y"),
        ];

        ledger.deliver(&wires, &outputs_of(&[("x", json!(7))]));

        let available = ledger.available_inputs("b");
        ledger.consume("b", &available);
        assert_eq!(ledger.available_inputs("b")["y"], json!(7));
    }

    #[test]
    fn test_consume_ignores_unlisted_ports() {
        let mut ledger = EdgeLedger::new();
        let wires = [
            Edge::wired("a", "b", "x", "y"),
            Edge::wired("a", "b", "x", "z"),
        ];
        ledger.deliver(&wires, &outputs_of(&[("x", json!(1))]));

        ledger.consume("b", &outputs_of(&[("y", json!(1))]));

        let available = ledger.available_inputs("b");
        assert!(!available.contains_key("y"));
        assert_eq!(available["z"], json!(1));
    }

    #[test]
    fn test_drained_ledger_equals_fresh_ledger() {
        let mut ledger = EdgeLedger::new();
        let wire = [Edge::wired("a", "b", "x", "y")];
        ledger.deliver(&wire, &outputs_of(&[("x", json!(1))]));

        let available = ledger.available_inputs("b");
        ledger.consume("b", &available);

        // Fully drained queues leave no husks behind, so a drained ledger is
        // indistinguishable from one that never delivered.
        assert_eq!(ledger, EdgeLedger::new());
    }

    #[test]
    fn test_ledger_serde_round_trip() {
        let mut ledger = EdgeLedger::new();
        ledger.deliver(
            &[Edge::wired("a", "b", "x", "y")],
            &outputs_of(&[("x", json!([1, 2]))]),
        );
        ledger.deliver(
            &[Edge::wired("a", "b", "x", "ctx").constant()],
            &outputs_of(&[("x", json!({"k": "v"}))]),
        );

        let text = serde_json::to_string(&ledger).unwrap();
        let restored: EdgeLedger = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, ledger);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_values_come_out_in_delivery_order(
                values in proptest::collection::vec(0i64..1000, 1..16)
            ) {
                let mut ledger = EdgeLedger::new();
                let wire = [Edge::wired("a", "b", "x", "y")];
                for value in &values {
                    ledger.deliver(&wire, &outputs_of(&[("x", json!(value))]));
                }

                let mut drained = Vec::new();
                loop {
                    let available = ledger.available_inputs("b");
                    let Some(head) = available.get("y") else { break };
                    drained.push(head.as_i64().unwrap());
                    ledger.consume("b", &available);
                }

                prop_assert_eq!(drained, values);
            }

            #[test]
            fn prop_ledger_round_trips_through_json(
                ports in proptest::collection::vec("[a-z]{1,6}", 1..5),
                values in proptest::collection::vec(0i64..100, 1..8)
            ) {
                let mut ledger = EdgeLedger::new();
                for port in &ports {
                    let wire = [Edge::wired("src", "dst", "out", port.as_str())];
                    for value in &values {
                        ledger.deliver(&wire, &outputs_of(&[("out", json!(value))]));
                    }
                }

                let text = serde_json::to_string(&ledger).unwrap();
                let restored: EdgeLedger = serde_json::from_str(&text).unwrap();
                prop_assert_eq!(restored, ledger);
            }
        }
    }
}
