//! Run a wired graph end to end
//!
//! This example loads a graph from YAML, runs it until it pauses at an input
//! node, then resumes with the answer and prints the collected outputs.

use serde_json::{json, Map, Value};
use wireflow_core::{
    event_channel, FnInvoker, GraphDescriptor, GraphView, RunConfig, RunOutcome, Runner,
    TraversalError,
};

const GRAPH: &str = r#"
url: demos/greeting.yaml
nodes:
  - id: ask
    type: input
  - id: shout
    type: uppercase
  - id: show
    type: output
edges:
  - from: ask
    to: shout
    out: name
    in: name
  - from: shout
    to: show
    out: greeting
    in: greeting
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Run A Graph ===\n");

    let descriptor = GraphDescriptor::from_yaml_str(GRAPH)?;
    let view = GraphView::new(descriptor)?;

    // The invoker maps node types to behavior; input and output nodes are
    // handled by the runner itself.
    let invoker = FnInvoker::new(|node, inputs: Map<String, Value>| match node.ty.as_str() {
        "uppercase" => {
            let name = inputs["name"].as_str().unwrap_or("stranger");
            let mut outputs = Map::new();
            outputs.insert(
                "greeting".to_string(),
                json!(format!("HELLO, {}!", name.to_uppercase())),
            );
            Ok(outputs)
        }
        other => Err(TraversalError::node(&node.id, format!("unknown type {other}"))),
    });

    let (tx, mut rx) = event_channel();
    let runner = Runner::new(view, invoker).with_config(RunConfig::new().with_event_sender(tx));

    // No inputs were provided, so the run pauses at the `ask` node.
    println!("Starting the run without inputs...\n");
    let outcome = runner.run().await?;

    let RunOutcome::AwaitingInput { node, snapshot } = outcome else {
        println!("Run finished without asking for anything.");
        return Ok(());
    };
    println!("Paused at input node '{}' ({} frame(s) captured)", node, snapshot.depth());
    println!("Events so far:");
    while let Ok(event) = rx.try_recv() {
        println!("  {}", serde_json::to_string(&event)?);
    }

    // A real host would park the snapshot and wait for a person. Here we
    // answer immediately.
    println!("\n=== Resuming with an answer ===\n");
    let mut answers = Map::new();
    answers.insert("name".to_string(), json!("ada"));
    let outcome = runner.resume(&snapshot, answers).await?;

    while let Ok(event) = rx.try_recv() {
        println!("  {}", serde_json::to_string(&event)?);
    }
    match outcome {
        RunOutcome::Completed { outputs } => {
            println!("\nRun complete: {}", serde_json::to_string_pretty(&outputs)?);
        }
        RunOutcome::AwaitingInput { node, .. } => {
            println!("\nStill waiting on '{}'", node);
        }
    }

    Ok(())
}
