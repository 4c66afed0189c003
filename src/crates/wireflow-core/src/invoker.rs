//! The host-side contract for executing nodes
//!
//! The engine never knows what a node does. Everything behavioral lives
//! behind [`NodeInvoker`]: the host (or its node-handler catalog) receives a
//! node descriptor and resolved inputs and produces outputs or an error,
//! asynchronously. The traversal treats both as opaque.
//!
//! Dispatching on the descriptor's `type` string is the host's business;
//! depending only on this trait keeps the engine free of any concrete handler
//! registry.
//!
//! # Examples
//!
//! ## Implementing the Trait
//!
//! ```rust
//! use wireflow_core::{NodeDescriptor, NodeInvoker, Result, TraversalError};
//! use async_trait::async_trait;
//! use serde_json::{json, Map, Value};
//!
//! struct Kit;
//!
//! #[async_trait]
//! impl NodeInvoker for Kit {
//!     async fn invoke(
//!         &self,
//!         node: &NodeDescriptor,
//!         inputs: Map<String, Value>,
//!     ) -> Result<Map<String, Value>> {
//!         match node.ty.as_str() {
//!             "upper" => {
//!                 let text = inputs["text"].as_str().unwrap_or_default();
//!                 let mut outputs = Map::new();
//!                 outputs.insert("text".to_string(), json!(text.to_uppercase()));
//!                 Ok(outputs)
//!             }
//!             other => Err(TraversalError::node(
//!                 &node.id,
//!                 format!("unknown node type '{other}'"),
//!             )),
//!         }
//!     }
//! }
//! ```
//!
//! ## Closures for Tests and Small Hosts
//!
//! ```rust
//! use wireflow_core::FnInvoker;
//! use serde_json::Map;
//!
//! let invoker = FnInvoker::new(|node, inputs| {
//!     println!("invoking {} ({})", node.id, node.ty);
//!     Ok(inputs) // echo
//! });
//! # let _ = invoker;
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::Result;
use crate::graph::NodeDescriptor;

/// Executes one node invocation on behalf of the engine
///
/// Implementations decide retry policy themselves; the engine never retries.
/// An error returned here surfaces unchanged as the run's failure (when
/// driven by the [`Runner`](crate::Runner)) or as whatever the host's own
/// loop decides.
#[async_trait]
pub trait NodeInvoker: Send + Sync {
    /// Run `node` with its resolved `inputs`, producing its outputs
    async fn invoke(
        &self,
        node: &NodeDescriptor,
        inputs: Map<String, Value>,
    ) -> Result<Map<String, Value>>;
}

#[async_trait]
impl<T: NodeInvoker + ?Sized> NodeInvoker for Arc<T> {
    async fn invoke(
        &self,
        node: &NodeDescriptor,
        inputs: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        (**self).invoke(node, inputs).await
    }
}

/// Adapter turning a plain function into a [`NodeInvoker`]
///
/// Handy for tests and synchronous hosts; anything needing to await inside
/// the invocation implements the trait directly.
pub struct FnInvoker<F> {
    function: F,
}

impl<F> FnInvoker<F>
where
    F: Fn(&NodeDescriptor, Map<String, Value>) -> Result<Map<String, Value>> + Send + Sync,
{
    /// Wrap a function as an invoker
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

#[async_trait]
impl<F> NodeInvoker for FnInvoker<F>
where
    F: Fn(&NodeDescriptor, Map<String, Value>) -> Result<Map<String, Value>> + Send + Sync,
{
    async fn invoke(
        &self,
        node: &NodeDescriptor,
        inputs: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        (self.function)(node, inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TraversalError;
    use serde_json::json;

    fn node(ty: &str) -> NodeDescriptor {
        NodeDescriptor::new("n1", ty)
    }

    #[tokio::test]
    async fn test_fn_invoker_dispatches_on_type() {
        let invoker = FnInvoker::new(|node, mut inputs| {
            inputs.insert("ty".to_string(), json!(node.ty));
            Ok(inputs)
        });
        let outputs = invoker.invoke(&node("double"), Map::new()).await.unwrap();
        assert_eq!(outputs["ty"], json!("double"));
    }

    #[tokio::test]
    async fn test_fn_invoker_propagates_errors() {
        let invoker =
            FnInvoker::new(|node, _inputs| Err(TraversalError::node(&node.id, "boom")));
        let err = invoker.invoke(&node("t"), Map::new()).await.unwrap_err();
        assert!(matches!(err, TraversalError::Node { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_arc_invoker_delegates() {
        let invoker: Arc<dyn NodeInvoker> = Arc::new(FnInvoker::new(|_, inputs| Ok(inputs)));
        let mut inputs = Map::new();
        inputs.insert("k".to_string(), json!(1));
        let outputs = invoker.invoke(&node("t"), inputs.clone()).await.unwrap();
        assert_eq!(outputs, inputs);
    }
}
