use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Map, Value};
use wireflow_core::{FnInvoker, GraphView, RunConfig, Runner, Step, StepResult, Traversal};

fn chain_view(len: usize) -> GraphView {
    let nodes: Vec<Value> = (0..len)
        .map(|i| json!({"id": format!("n{i}"), "type": "work"}))
        .collect();
    let edges: Vec<Value> = (1..len)
        .map(|i| json!({"from": format!("n{}", i - 1), "to": format!("n{i}"), "out": "x", "in": "x"}))
        .collect();
    let descriptor = serde_json::from_value(json!({"nodes": nodes, "edges": edges})).unwrap();
    GraphView::new(descriptor).unwrap()
}

fn cycle_view() -> GraphView {
    let descriptor = serde_json::from_value(json!({
        "nodes": [{"id": "seed", "type": "emit"}, {"id": "count", "type": "tick"}],
        "edges": [
            {"from": "seed", "to": "count", "out": "ctx", "in": "ctx", "constant": true},
            {"from": "seed", "to": "count", "out": "n", "in": "n"},
            {"from": "count", "to": "count", "out": "n", "in": "n"}
        ]
    }))
    .unwrap();
    GraphView::new(descriptor).unwrap()
}

fn walk_to_done(traversal: &Traversal, mut outputs_for: impl FnMut(&StepResult) -> Map<String, Value>) {
    let mut step = traversal.start().unwrap();
    loop {
        match traversal.step(step).unwrap() {
            Step::Next(mut next) => {
                if !next.skip {
                    let outputs = outputs_for(&next);
                    next.provide_outputs(outputs);
                }
                step = next;
            }
            Step::Done => return,
        }
    }
}

fn chain_walk_benchmark(c: &mut Criterion) {
    let traversal = Traversal::new(chain_view(64));
    let outputs: Map<String, Value> = [("x".to_string(), json!(1))].into_iter().collect();

    c.bench_function("traversal chain walk", |b| {
        b.iter(|| {
            walk_to_done(black_box(&traversal), |_| outputs.clone());
        });
    });
}

fn cycle_laps_benchmark(c: &mut Criterion) {
    let traversal = Traversal::new(cycle_view());

    c.bench_function("traversal cycle laps", |b| {
        b.iter(|| {
            walk_to_done(black_box(&traversal), |step| {
                if step.node_id() == "seed" {
                    return [
                        ("ctx".to_string(), json!("base")),
                        ("n".to_string(), json!(0)),
                    ]
                    .into_iter()
                    .collect();
                }
                let n = step.inputs["n"].as_i64().unwrap();
                if n < 100 {
                    [("n".to_string(), json!(n + 1))].into_iter().collect()
                } else {
                    Map::new()
                }
            });
        });
    });
}

fn runner_pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let view = serde_json::from_value(json!({
        "nodes": [
            {"id": "take", "type": "input"},
            {"id": "double", "type": "work"},
            {"id": "give", "type": "output"}
        ],
        "edges": [
            {"from": "take", "to": "double", "out": "n", "in": "n"},
            {"from": "double", "to": "give", "out": "n", "in": "n"}
        ]
    }))
    .map(|descriptor| GraphView::new(descriptor).unwrap())
    .unwrap();

    c.bench_function("runner pipeline run", |b| {
        b.to_async(&runtime).iter(|| async {
            let invoker = FnInvoker::new(|_, inputs: Map<String, Value>| {
                let n = inputs["n"].as_i64().unwrap_or_default();
                Ok([("n".to_string(), json!(n * 2))].into_iter().collect())
            });
            let inputs: Map<String, Value> = [("n".to_string(), json!(21))].into_iter().collect();
            let runner = Runner::new(view.clone(), invoker)
                .with_config(RunConfig::new().with_inputs(inputs));

            black_box(runner.run().await.unwrap());
        });
    });
}

criterion_group!(
    benches,
    chain_walk_benchmark,
    cycle_laps_benchmark,
    runner_pipeline_benchmark
);
criterion_main!(benches);
