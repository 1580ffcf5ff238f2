//! Error path E2E tests.
//!
//! Contract violations between query builder and backend are fatal; caller
//! errors are rejected before any backend call.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::json;

use e2e_tests::{aggs_response, TestHarness};
use lod_search::MockSearchBackend;
use lod_types::{ExploreRequest, LodError};

/// A batch answered with fewer responses than queries fails the request.
#[tokio::test]
async fn test_batch_mismatch_is_fatal() {
    let backend =
        MockSearchBackend::default().with_batch_json(vec![aggs_response(1, &[], vec![])]);
    let harness = TestHarness::new(backend);

    let err = harness
        .service
        .aggregate(&ExploreRequest::new(["Dresden"]))
        .await
        .unwrap_err();

    match err {
        LodError::BatchMismatch { expected, actual } => {
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("expected BatchMismatch, got {other:?}"),
    }
    assert!(!LodError::BatchMismatch { expected: 2, actual: 1 }.is_client_error());
}

/// A response lacking a requested aggregation fails the request.
#[tokio::test]
async fn test_missing_aggregation_is_fatal() {
    let partial = json!({
        "hits": {"total": 1, "hits": []},
        "aggregations": {"genres": {"buckets": []}}
    });
    let backend = MockSearchBackend::default()
        .with_batch_json(vec![partial.clone(), partial]);
    let harness = TestHarness::new(backend);

    let err = harness
        .service
        .aggregate(&ExploreRequest::new(["Dresden"]))
        .await
        .unwrap_err();

    assert!(matches!(err, LodError::MissingAggregation { .. }));
}

/// A template naming an unregistered method is rejected without backend calls.
#[tokio::test]
async fn test_unknown_template_method() {
    let harness = TestHarness::new(MockSearchBackend::default());
    let mut request = ExploreRequest::new(["Dresden"]);
    request.query_template = Some(BTreeMap::from([(
        "fuzzyMatch".to_string(),
        json!({"query": {"match": {"name": "{{subject}}"}}}),
    )]));

    let err = harness.service.aggregate(&request).await.unwrap_err();

    assert!(err.is_client_error());
    assert!(err.to_string().contains("fuzzyMatch"));
    assert!(harness.backend.calls().is_empty());
}

/// Blank subjects are caller errors.
#[tokio::test]
async fn test_blank_subject_rejected() {
    let harness = TestHarness::new(MockSearchBackend::default());

    let err = harness
        .service
        .correlate(&ExploreRequest::new(["Dresden", " "]))
        .await
        .unwrap_err();

    assert!(err.is_client_error());
    assert!(harness.backend.calls().is_empty());
}

/// Backend failures propagate unchanged.
#[tokio::test]
async fn test_backend_error_propagates() {
    let harness = TestHarness::new(MockSearchBackend::default());

    let err = harness
        .service
        .explore(&ExploreRequest::new(["Dresden"]))
        .await
        .unwrap_err();

    assert!(matches!(err, LodError::Backend(_)));
    assert!(!err.is_client_error());
}

/// Collections outside the projection registry are skipped, not fatal.
#[tokio::test]
async fn test_unprojected_collection_skipped() {
    let harness = TestHarness::new(MockSearchBackend::default());

    let pool = harness
        .service
        .resolve_entities(&["https://data.slub-dresden.de/swb-aut/1"])
        .await
        .unwrap();

    assert!(pool.collection("swb-aut").is_none());
    assert_eq!(harness.backend.multi_get_count(), 0);
}
