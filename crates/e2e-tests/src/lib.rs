//! End-to-end test infrastructure for the LOD exploration engine.
//!
//! Provides a shared TestHarness wiring an [`ExploreService`] to a mock
//! backend, plus builders for the canned backend responses the tests queue.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use lod_explore::ExploreService;
use lod_search::MockSearchBackend;
use lod_types::Settings;

/// URI prefix of every entity in the default configuration.
pub const PREFIX: &str = "https://data.slub-dresden.de/";

/// Aggregations every built aggregation query requests.
pub const AGG_NAMES: [&str; 5] = [
    "topAuthors",
    "datePublished",
    "mentions",
    "genres",
    "topRelatedTopics",
];

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Mock backend, kept for call assertions
    pub backend: Arc<MockSearchBackend>,
    /// Settings the service runs with
    pub settings: Arc<Settings>,
    /// Service under test
    pub service: ExploreService<MockSearchBackend>,
}

impl TestHarness {
    /// Harness with default settings over `backend`.
    pub fn new(backend: MockSearchBackend) -> Self {
        Self::with_settings(backend, Settings::default())
    }

    /// Harness with custom settings over `backend`.
    pub fn with_settings(backend: MockSearchBackend, settings: Settings) -> Self {
        let backend = Arc::new(backend);
        let settings = Arc::new(settings);
        let service = ExploreService::new(backend.clone(), settings.clone());
        Self {
            backend,
            settings,
            service,
        }
    }
}

/// Full URI of an entity.
pub fn uri(collection: &str, id: &str) -> String {
    format!("{PREFIX}{collection}/{id}")
}

/// Aggregation query response with all standard aggregations present.
///
/// `buckets` supplies bucket lists by aggregation name; the rest are empty.
pub fn aggs_response(total: u64, buckets: &[(&str, Value)], hits: Vec<Value>) -> Value {
    let aggregations: Map<String, Value> = AGG_NAMES
        .iter()
        .map(|name| {
            let list = buckets
                .iter()
                .find(|(agg, _)| agg == name)
                .map(|(_, list)| list.clone())
                .unwrap_or_else(|| json!([]));
            (name.to_string(), json!({ "buckets": list }))
        })
        .collect();
    json!({
        "hits": {"total": {"value": total, "relation": "eq"}, "hits": hits},
        "aggregations": aggregations
    })
}

/// Bare count response.
pub fn count_response(total: u64) -> Value {
    json!({"hits": {"total": {"value": total, "relation": "eq"}, "hits": []}})
}

/// Adjacency matrix response under the standard aggregation name.
pub fn matrix_response(buckets: &[(&str, u64)]) -> Value {
    let buckets: Vec<Value> = buckets
        .iter()
        .map(|(key, count)| json!({"key": key, "doc_count": count}))
        .collect();
    json!({
        "hits": {"total": 0, "hits": []},
        "aggregations": {"cooccurrence": {"buckets": buckets}}
    })
}

/// A resource hit.
pub fn resource_hit(id: &str, score: f64, name: &str) -> Value {
    json!({
        "_id": id,
        "_index": "slub-resources",
        "_score": score,
        "_source": {"@id": uri("resources", id), "preferredName": name}
    })
}

/// A page of topic hits numbered `ids`.
pub fn topic_page(total: u64, ids: std::ops::Range<usize>) -> Value {
    let hits: Vec<Value> = ids
        .map(|n| {
            json!({
                "_id": n.to_string(),
                "_index": "topics-explorativ",
                "_score": 1.0,
                "_source": {"@id": uri("topics", &n.to_string()), "preferredName": format!("Topic {n}")}
            })
        })
        .collect();
    json!({"hits": {"total": {"value": total, "relation": "eq"}, "hits": hits}})
}

/// Terms bucket list from `(key, count)` pairs.
pub fn buckets(pairs: &[(&str, u64)]) -> Value {
    Value::Array(
        pairs
            .iter()
            .map(|(key, count)| json!({"key": key, "doc_count": count}))
            .collect(),
    )
}
