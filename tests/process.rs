//! Tests for the calculation process tracker.
mod common;
use common::TestBench;
use kairo::prelude::*;
use serde_json::json;

async fn sum_workspace(bench: &TestBench, a: &str, b: &str) -> Node {
    let a = bench.node("numberInputNode", &[("value", a)]).await;
    let b = bench.node("numberInputNode", &[("value", b)]).await;
    let sum = bench.node("sumNode", &[]).await;
    let output = bench.node("numberOutputNode", &[]).await;
    bench.connect(&a, "value", &sum, "a").await;
    bench.connect(&b, "value", &sum, "b").await;
    bench.connect(&sum, "sum", &output, "value").await;
    output
}

#[tokio::test]
async fn test_successful_run() {
    let bench = TestBench::new().await;
    let output = sum_workspace(&bench, "18", "81").await;
    let tracker = CalculationTracker::new(&bench.store, &bench.registry);

    let process = tracker.start(&bench.workspace_id).await.unwrap();
    assert_eq!(process.state, ProcessState::Successful);
    assert_eq!(process.total_outputs, 1);
    assert_eq!(process.processed_outputs, 1);
    assert!(process.finished_at.is_some());

    let result = bench.store.get_result(&output.id).await.unwrap();
    assert_eq!(result, Some(json!({ "value": 99.0 })));
}

#[tokio::test]
async fn test_run_covers_every_terminal_node() {
    let bench = TestBench::new().await;
    sum_workspace(&bench, "1", "2").await;
    let lone_input = bench.node("stringInputNode", &[("value", "hi")]).await;
    let second = bench.node("stringOutputNode", &[]).await;
    bench.connect(&lone_input, "value", &second, "value").await;
    let tracker = CalculationTracker::new(&bench.store, &bench.registry);

    let process = tracker.start(&bench.workspace_id).await.unwrap();
    assert_eq!(process.state, ProcessState::Successful);
    assert_eq!(process.total_outputs, 2);
    assert_eq!(process.processed_outputs, 2);
}

#[tokio::test]
async fn test_failed_run_is_recorded_not_raised() {
    let bench = TestBench::new().await;
    let broken = bench.node("numberInputNode", &[("value", "{NaN")]).await;
    let output = bench.node("numberOutputNode", &[]).await;
    bench.connect(&broken, "value", &output, "value").await;
    let tracker = CalculationTracker::new(&bench.store, &bench.registry);

    let process = tracker.start(&bench.workspace_id).await.unwrap();
    assert_eq!(process.state, ProcessState::Error);
    assert!(process.finished_at.is_some());
    assert_eq!(bench.store.get_result(&output.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_process_record_is_durable() {
    let bench = TestBench::new().await;
    sum_workspace(&bench, "2", "3").await;
    let tracker = CalculationTracker::new(&bench.store, &bench.registry);

    let process = tracker.start(&bench.workspace_id).await.unwrap();
    let stored = tracker.get(&process.id).await.unwrap().unwrap();
    assert_eq!(stored.id, process.id);
    assert_eq!(stored.state, ProcessState::Successful);
    assert_eq!(stored.workspace_id, bench.workspace_id);
}

#[tokio::test]
async fn test_empty_workspace_run_succeeds() {
    let bench = TestBench::new().await;
    let tracker = CalculationTracker::new(&bench.store, &bench.registry);

    let process = tracker.start(&bench.workspace_id).await.unwrap();
    assert_eq!(process.state, ProcessState::Successful);
    assert_eq!(process.total_outputs, 0);
    assert_eq!(process.processed_outputs, 0);
}
