//! Tests for real graph execution, scope invocation, and memoization.
mod common;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::TestBench;
use kairo::prelude::*;
use kairo::types::present_outputs;
use serde_json::json;

#[tokio::test]
async fn test_string_passthrough() {
    let bench = TestBench::new().await;
    let input = bench.node("stringInputNode", &[("value", "hello")]).await;
    let output = bench.node("stringOutputNode", &[]).await;
    bench.connect(&input, "value", &output, "value").await;

    let output = bench.reload(&output.id).await;
    let produced = bench.executor().execute_by_id(&output.id).await.unwrap();
    assert_eq!(produced.result, Some(json!({ "value": "hello" })));
    assert!(produced.outputs.is_empty());
}

#[tokio::test]
async fn test_sum_of_two_numbers() {
    let bench = TestBench::new().await;
    let a = bench.node("numberInputNode", &[("value", "18")]).await;
    let b = bench.node("numberInputNode", &[("value", "81")]).await;
    let sum = bench.node("sumNode", &[]).await;
    let output = bench.node("numberOutputNode", &[]).await;
    bench.connect(&a, "value", &sum, "a").await;
    bench.connect(&b, "value", &sum, "b").await;
    bench.connect(&sum, "sum", &output, "value").await;

    let produced = bench.executor().execute_by_id(&output.id).await.unwrap();
    assert_eq!(produced.result, Some(json!({ "value": 99.0 })));
}

#[tokio::test]
async fn test_invalid_form_fails_execution() {
    let bench = TestBench::new().await;
    let input = bench.node("numberInputNode", &[("value", "{NaN")]).await;

    let err = bench.executor().execute_by_id(&input.id).await.unwrap_err();
    assert!(matches!(err, GraphError::FormInvalid { node_id } if node_id == input.id));
}

#[tokio::test]
async fn test_invalid_form_propagates_to_consumer() {
    let bench = TestBench::new().await;
    let input = bench.node("numberInputNode", &[("value", "{NaN")]).await;
    let output = bench.node("numberOutputNode", &[]).await;
    bench.connect(&input, "value", &output, "value").await;

    // The failure names the misconfigured source, not the node asked for.
    let err = bench.executor().execute_by_id(&output.id).await.unwrap_err();
    assert!(matches!(err, GraphError::FormInvalid { node_id } if node_id == input.id));
}

#[tokio::test]
async fn test_missing_input_fails_execution() {
    let bench = TestBench::new().await;
    let sum = bench.node("sumNode", &[]).await;

    let err = bench.executor().execute_by_id(&sum.id).await.unwrap_err();
    assert!(matches!(err, GraphError::InputInvalid { node_id } if node_id == sum.id));
}

#[tokio::test]
async fn test_boundary_node_needs_scope_invocation() {
    let bench = TestBench::new().await;
    let edit = bench.node("editEntriesNode", &[]).await;
    let scope_input = bench.scope_child(&edit, SCOPE_INPUT_TYPE).await;

    let err = bench
        .executor()
        .execute_by_id(&scope_input.id)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::MissingScopeContext { .. }));
}

#[tokio::test]
async fn test_edit_entries_identity_scope() {
    let bench = TestBench::new().await;
    let dataset = bench
        .string_dataset("samples", &["val"], &[&[("val", "test")]])
        .await;
    let source = bench
        .node("datasetInputNode", &[("dataset", &dataset.id)])
        .await;
    let edit = bench.node("editEntriesNode", &[]).await;
    let sink = bench.node("datasetOutputNode", &[]).await;
    bench.connect(&source, "dataset", &edit, "dataset").await;
    bench.connect(&edit, "dataset", &sink, "dataset").await;

    let scope_input = bench.scope_child(&edit, SCOPE_INPUT_TYPE).await;
    let scope_output = bench.scope_child(&edit, SCOPE_OUTPUT_TYPE).await;
    bench
        .connect(&scope_input, "val", &scope_output, "val")
        .await;

    let produced = bench.executor().execute_by_id(&sink.id).await.unwrap();
    let result = produced.result.unwrap();
    let produced_id = result["dataset"].as_str().unwrap().to_string();
    assert_ne!(produced_id, dataset.id);

    let copied = bench
        .store
        .get_dataset(&produced_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(copied.schema, dataset.schema);

    let entries = bench.store.entries_of(&produced_id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].values,
        SocketValues::from_iter([("val".to_string(), json!("test"))])
    );
}

#[tokio::test]
async fn test_missing_scope_output_fails() {
    let bench = TestBench::new().await;
    let dataset = bench
        .string_dataset("samples", &["val"], &[&[("val", "test")]])
        .await;
    let source = bench
        .node("datasetInputNode", &[("dataset", &dataset.id)])
        .await;
    let edit = bench.node("editEntriesNode", &[]).await;
    bench.connect(&source, "dataset", &edit, "dataset").await;

    let scope_output = bench.scope_child(&edit, SCOPE_OUTPUT_TYPE).await;
    bench.store.delete_node(&scope_output.id).await.unwrap();

    let err = bench.executor().execute_by_id(&edit.id).await.unwrap_err();
    assert!(matches!(err, GraphError::MissingScopeBoundary { node_id } if node_id == edit.id));
}

/// Counts how often its execution body runs; used to observe sharing.
struct CountingType {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl NodeType for CountingType {
    fn name(&self) -> &str {
        "countingNode"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::new("value", DataType::Number)]
    }

    async fn on_meta(
        &self,
        _form: &Form,
        _inputs: &SocketMetas,
        _store: &dyn Store,
    ) -> std::result::Result<SocketMetas, GraphError> {
        Ok(present_outputs(&self.outputs()))
    }

    async fn on_execute(
        &self,
        _ctx: ExecutionContext<'_>,
    ) -> std::result::Result<NodeOutput, GraphError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(NodeOutput::from_outputs(SocketValues::from_iter([(
            "value".to_string(),
            json!(1.0),
        )])))
    }
}

async fn diamond_bench(calls: Arc<AtomicUsize>) -> (TestBench, Node) {
    let mut builder = NodeTypeRegistry::builder().with_defaults();
    builder.register(Arc::new(CountingType { calls }));
    let bench = TestBench::with_registry(builder.build()).await;

    let shared = bench.node("countingNode", &[]).await;
    let sum = bench.node("sumNode", &[]).await;
    let output = bench.node("numberOutputNode", &[]).await;
    bench.connect(&shared, "value", &sum, "a").await;
    bench.connect(&shared, "value", &sum, "b").await;
    bench.connect(&sum, "sum", &output, "value").await;
    (bench, output)
}

#[tokio::test]
async fn test_shared_upstream_runs_per_consumer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (bench, output) = diamond_bench(calls.clone()).await;

    let produced = bench.executor().execute_by_id(&output.id).await.unwrap();
    assert_eq!(produced.result, Some(json!({ "value": 2.0 })));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_memoization_shares_upstream_results() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (bench, output) = diamond_bench(calls.clone()).await;

    let executor = GraphExecutor::with_memoization(&bench.store, &bench.registry);
    let produced = executor.execute_by_id(&output.id).await.unwrap();
    assert_eq!(produced.result, Some(json!({ "value": 2.0 })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
