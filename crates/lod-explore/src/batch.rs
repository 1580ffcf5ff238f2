//! Batched query execution with exact-count correction.
//!
//! All queries of one batch travel in a single multi-search call. The backend
//! answers in query order; responses are paired with their queries strictly by
//! position and handed back together with the query's tag.
//!
//! The backend stops counting hits at a configured ceiling. When a response
//! reports exactly that ceiling, the query is re-issued once as a standalone
//! count and that total becomes the authoritative document count. The capped
//! response (hits and aggregations) is kept as-is.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use lod_search::{SearchBackend, SearchResponse};
use lod_types::{LodError, Result};

use crate::query::build_exact_count_query;

/// A query together with the caller's tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedQuery<T> {
    pub tag: T,
    pub query: Value,
}

/// A response re-associated with its query.
#[derive(Debug, Clone)]
pub struct BatchResponse<T> {
    /// Tag of the query this answers
    pub tag: T,

    /// The query as sent
    pub query: Value,

    /// Raw backend response
    pub response: SearchResponse,

    /// Authoritative hit count
    pub doc_count: u64,

    /// True if `doc_count` came from a correction re-query
    pub corrected: bool,
}

/// Executes searches against a backend, applying count correction.
pub struct BatchExecutor<B: SearchBackend + 'static> {
    backend: Arc<B>,
    cap_limit: u64,
}

impl<B: SearchBackend + 'static> BatchExecutor<B> {
    /// Create a new executor for a backend that caps totals at `cap_limit`.
    pub fn new(backend: Arc<B>, cap_limit: u64) -> Self {
        Self { backend, cap_limit }
    }

    /// The configured reporting ceiling.
    pub fn cap_limit(&self) -> u64 {
        self.cap_limit
    }

    /// Run a single query, without count correction.
    pub async fn search(&self, index: &str, query: &Value) -> Result<SearchResponse> {
        self.backend.search(index, query).await
    }

    /// Run all queries as one multi-search call.
    ///
    /// The returned list has one entry per query, in query order. A response
    /// count that differs from the query count is a contract violation and
    /// fails the whole batch.
    pub async fn run_batch<T>(
        &self,
        index: &str,
        queries: Vec<TaggedQuery<T>>,
    ) -> Result<Vec<BatchResponse<T>>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let bodies: Vec<Value> = queries.iter().map(|q| q.query.clone()).collect();
        debug!(index, queries = bodies.len(), "Running batch");
        let responses = self.backend.multi_search(index, &bodies).await?;

        if responses.len() != queries.len() {
            return Err(LodError::BatchMismatch {
                expected: queries.len(),
                actual: responses.len(),
            });
        }

        let mut results = Vec::with_capacity(queries.len());
        for (TaggedQuery { tag, query }, response) in queries.into_iter().zip(responses) {
            let (doc_count, corrected) = self.exact_count(index, &query, &response).await?;
            results.push(BatchResponse {
                tag,
                query,
                response,
                doc_count,
                corrected,
            });
        }
        Ok(results)
    }

    /// Authoritative hit count for `response`, re-querying once if it hit the cap.
    async fn exact_count(
        &self,
        index: &str,
        query: &Value,
        response: &SearchResponse,
    ) -> Result<(u64, bool)> {
        let reported = response.total();
        if reported != self.cap_limit {
            return Ok((reported, false));
        }

        let count_query = build_exact_count_query(query);
        let exact = self.backend.search(index, &count_query).await?.total();
        warn!(
            index,
            reported, exact, "Hit count reached the reporting cap, corrected by re-query"
        );
        Ok((exact, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lod_search::{MockSearchBackend, RecordedCall};
    use serde_json::json;

    fn total(value: u64) -> Value {
        json!({"hits": {"total": {"value": value, "relation": "eq"}, "hits": []}})
    }

    fn tagged(tags: &[&'static str]) -> Vec<TaggedQuery<&'static str>> {
        tags.iter()
            .map(|tag| TaggedQuery {
                tag: *tag,
                query: json!({"query": {"match_phrase": {"name": tag}}, "aggs": {}}),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_responses_keep_query_order() {
        let backend = Arc::new(MockSearchBackend::default().with_batch_json(vec![total(1), total(2)]));
        let executor = BatchExecutor::new(backend, 10_000);

        let results = executor
            .run_batch("slub-resources", tagged(&["first", "second"]))
            .await
            .unwrap();

        assert_eq!(results[0].tag, "first");
        assert_eq!(results[0].doc_count, 1);
        assert_eq!(results[1].tag, "second");
        assert_eq!(results[1].doc_count, 2);
        assert!(!results[0].corrected);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_fatal() {
        let backend = Arc::new(MockSearchBackend::default().with_batch_json(vec![total(1)]));
        let executor = BatchExecutor::new(backend, 10_000);

        let err = executor
            .run_batch("slub-resources", tagged(&["first", "second"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LodError::BatchMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_capped_total_is_corrected_once() {
        let backend = Arc::new(
            MockSearchBackend::default()
                .with_batch_json(vec![total(10_000), total(7)])
                .with_search_json(total(10_001)),
        );
        let executor = BatchExecutor::new(backend.clone(), 10_000);
        assert_eq!(executor.cap_limit(), 10_000);

        let results = executor
            .run_batch("slub-resources", tagged(&["capped", "exact"]))
            .await
            .unwrap();

        assert_eq!(results[0].doc_count, 10_001);
        assert!(results[0].corrected);
        assert_eq!(results[0].response.total(), 10_000);
        assert_eq!(results[1].doc_count, 7);

        let searches: Vec<_> = backend
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Search { query, .. } => Some(query),
                _ => None,
            })
            .collect();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0]["track_total_hits"], true);
        assert!(searches[0].get("aggs").is_none());
    }

    #[tokio::test]
    async fn test_empty_batch_skips_backend() {
        let backend = Arc::new(MockSearchBackend::default());
        let executor = BatchExecutor::new(backend.clone(), 10_000);

        let results = executor
            .run_batch::<()>("slub-resources", Vec::new())
            .await
            .unwrap();
        assert!(results.is_empty());
        assert!(backend.calls().is_empty());
    }
}
