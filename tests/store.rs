//! Tests for the in-memory store's dataset constraints and entry iteration.
mod common;
use std::sync::atomic::{AtomicU64, Ordering};

use common::TestBench;
use futures::FutureExt;
use kairo::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_workspace_round_trip() {
    let bench = TestBench::new().await;
    let stored = bench
        .store
        .get_workspace(&bench.workspace_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, bench.workspace_id);
    assert_eq!(stored.name, "Test workspace");
    assert!(bench.store.get_workspace("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_schema_fields_rejected() {
    let bench = TestBench::new().await;
    let schema = vec![
        ValueSchema::new("name", DataType::String),
        ValueSchema::new("name", DataType::Number),
    ];

    let err = bench.store.create_dataset("bad", schema).await.unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));
}

#[tokio::test]
async fn test_missing_required_field_rejected() {
    let bench = TestBench::new().await;
    let dataset = bench.string_dataset("people", &["name", "city"], &[]).await;

    let values = SocketValues::from_iter([("name".to_string(), json!("ada"))]);
    let err = bench
        .store
        .create_entry(&dataset.id, values)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));
}

#[tokio::test]
async fn test_optional_field_may_be_omitted() {
    let bench = TestBench::new().await;
    let schema = vec![
        ValueSchema::new("name", DataType::String),
        ValueSchema::new("city", DataType::String).optional(),
    ];
    let dataset = bench.store.create_dataset("people", schema).await.unwrap();

    let values = SocketValues::from_iter([("name".to_string(), json!("ada"))]);
    let entry = bench.store.create_entry(&dataset.id, values).await.unwrap();
    assert_eq!(entry.values.len(), 1);
}

#[tokio::test]
async fn test_unknown_field_rejected() {
    let bench = TestBench::new().await;
    let dataset = bench.string_dataset("people", &["name"], &[]).await;

    let values = SocketValues::from_iter([
        ("name".to_string(), json!("ada")),
        ("age".to_string(), json!(36)),
    ]);
    let err = bench
        .store
        .create_entry(&dataset.id, values)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));
}

#[tokio::test]
async fn test_unique_field_enforced() {
    let bench = TestBench::new().await;
    let schema = vec![ValueSchema::new("email", DataType::String).unique()];
    let dataset = bench.store.create_dataset("accounts", schema).await.unwrap();

    let values = SocketValues::from_iter([("email".to_string(), json!("a@b.c"))]);
    bench
        .store
        .create_entry(&dataset.id, values.clone())
        .await
        .unwrap();
    let err = bench
        .store
        .create_entry(&dataset.id, values)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { field, .. } if field == "email"));
}

#[tokio::test]
async fn test_for_each_entry_visits_all_pages() {
    let bench = TestBench::new().await;
    let dataset = bench.string_dataset("big", &["n"], &[]).await;
    // More than one page at the 256-entry page size.
    for i in 0..600 {
        let values = SocketValues::from_iter([("n".to_string(), json!(i.to_string()))]);
        bench.store.create_entry(&dataset.id, values).await.unwrap();
    }
    assert_eq!(bench.store.entry_count(&dataset.id).await, 600);

    let visited = AtomicU64::new(0);
    let mut visit = |_entry: Entry| {
        visited.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(Ok::<(), GraphError>(())).boxed()
    };
    let progress_calls = AtomicU64::new(0);
    let progress = |done: u64, total: u64| {
        progress_calls.fetch_add(1, Ordering::SeqCst);
        assert!(done <= total);
        assert_eq!(total, 600);
    };

    let count = bench
        .store
        .for_each_entry(&dataset.id, &mut visit, Some(&progress))
        .await
        .unwrap();
    assert_eq!(count, 600);
    assert_eq!(visited.load(Ordering::SeqCst), 600);
    // 600 entries at 256 per page is three pages.
    assert_eq!(progress_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_visitor_error_propagates_unflattened() {
    let bench = TestBench::new().await;
    let dataset = bench
        .string_dataset("people", &["name"], &[&[("name", "ada")]])
        .await;

    let mut visit = |_entry: Entry| {
        futures::future::ready(Err::<(), _>(GraphError::FormInvalid {
            node_id: "n1".to_string(),
        }))
        .boxed()
    };
    let err = bench
        .store
        .for_each_entry(&dataset.id, &mut visit, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::FormInvalid { .. }));
}
