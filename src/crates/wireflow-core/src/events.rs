//! Lifecycle events emitted while a run executes
//!
//! The [`Runner`](crate::Runner) reports its progress through an optional
//! unbounded channel of [`RunEvent`]s. Delivery is best effort: a dropped
//! receiver never stalls or fails the run. Events are serde data (tagged
//! `event`/`data` envelopes) so hosts can forward them over a wire as-is.
//!
//! # Event Order
//!
//! A completed run emits, per graph level:
//!
//! ```text
//! GraphStart
//!   NodeStart ──▶ (Output)? ──▶ NodeEnd      for each invoked node
//!   Skip                                     for each skipped node
//!   NodeStart ──▶ InputRequired              when pausing for input
//!   NodeStart ──▶ Error                      when an invocation fails
//! GraphEnd
//! ```
//!
//! Sub-graph events nest between the parent node's `NodeStart` and `NodeEnd`.
//!
//! # Examples
//!
//! ```rust
//! use wireflow_core::{event_channel, RunEvent};
//!
//! let (tx, mut rx) = event_channel();
//! tx.send(RunEvent::GraphStart { url: "boards/echo.json".to_string() }).ok();
//!
//! if let Ok(event) = rx.try_recv() {
//!     assert!(matches!(event, RunEvent::GraphStart { .. }));
//! }
//! ```

use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::graph::NodeId;

/// Sending half of a run event channel
pub type EventSender = mpsc::UnboundedSender<RunEvent>;

/// Receiving half of a run event channel
pub type EventReceiver = mpsc::UnboundedReceiver<RunEvent>;

/// Stream of run events, ordered as emitted
pub type EventStream = Pin<Box<dyn Stream<Item = RunEvent> + Send>>;

/// Create an unbounded channel for run events
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Wrap a receiver so events compose with `StreamExt` combinators
pub fn into_event_stream(rx: EventReceiver) -> EventStream {
    Box::pin(UnboundedReceiverStream::new(rx))
}

/// Events emitted during a run
///
/// Serialized with an `event` tag and a `data` payload:
///
/// ```json
/// {"event": "NodeStart", "data": {"node": "ask", "inputs": {}}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum RunEvent {
    /// A graph (root or nested) began executing
    GraphStart {
        /// Frame url of the graph
        url: String,
    },

    /// A node is about to be invoked
    NodeStart {
        /// Node being invoked
        node: NodeId,
        /// Resolved inputs handed to the node
        inputs: Map<String, Value>,
    },

    /// A node was considered but its required inputs are incomplete
    Skip {
        /// Node that was skipped
        node: NodeId,
        /// Required ports still missing, sorted
        missing: Vec<String>,
    },

    /// A node invocation finished
    NodeEnd {
        /// Node that ran
        node: NodeId,
        /// Outputs it produced
        outputs: Map<String, Value>,
    },

    /// An `output` node recorded run outputs
    Output {
        /// The output node
        node: NodeId,
        /// Values recorded into the run's output map
        outputs: Map<String, Value>,
    },

    /// An `input` node has no answer; the run is pausing
    InputRequired {
        /// The input node awaiting an answer
        node: NodeId,
    },

    /// A node invocation failed; the run ends after this event
    Error {
        /// Node that failed
        node: NodeId,
        /// Failure description
        message: String,
    },

    /// A graph (root or nested) finished executing
    GraphEnd {
        /// Frame url of the graph
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_events_use_tagged_envelope() {
        let event = RunEvent::Skip {
            node: "b".to_string(),
            missing: vec!["y".to_string()],
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], json!("Skip"));
        assert_eq!(value["data"]["node"], json!("b"));
        assert_eq!(value["data"]["missing"], json!(["y"]));
    }

    #[test]
    fn test_event_round_trip() {
        let mut outputs = Map::new();
        outputs.insert("text".to_string(), json!("hi"));
        let event = RunEvent::NodeEnd {
            node: "n".to_string(),
            outputs,
        };
        let text = serde_json::to_string(&event).unwrap();
        let restored: RunEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, event);
    }

    #[tokio::test]
    async fn test_channel_delivers_in_order() {
        let (tx, mut rx) = event_channel();
        tx.send(RunEvent::GraphStart {
            url: String::new(),
        })
        .unwrap();
        tx.send(RunEvent::GraphEnd {
            url: String::new(),
        })
        .unwrap();
        drop(tx);

        assert!(matches!(
            rx.recv().await,
            Some(RunEvent::GraphStart { .. })
        ));
        assert!(matches!(rx.recv().await, Some(RunEvent::GraphEnd { .. })));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_adapter_yields_until_sender_drops() {
        use futures::StreamExt;

        let (tx, rx) = event_channel();
        tx.send(RunEvent::InputRequired {
            node: "ask".to_string(),
        })
        .unwrap();
        drop(tx);

        let mut stream = into_event_stream(rx);
        assert!(matches!(
            stream.next().await,
            Some(RunEvent::InputRequired { node }) if node == "ask"
        ));
        assert!(stream.next().await.is_none());
    }
}
