//! In-memory backend serving canned responses.
//!
//! Responses are consumed in FIFO order per operation. Running out of queued
//! responses is an error, so a caller that loops too often fails instead of
//! hanging.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use lod_types::{LodError, Result};

use crate::backend::SearchBackend;
use crate::response::{GetDocument, SearchResponse};

/// A call the mock received.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Search { index: String, query: Value },
    MultiSearch { index: String, queries: Vec<Value> },
    MultiGet { index: String, ids: Vec<String> },
}

/// Mock search backend for testing.
#[derive(Default)]
pub struct MockSearchBackend {
    searches: Mutex<VecDeque<SearchResponse>>,
    batches: Mutex<VecDeque<Vec<SearchResponse>>>,
    documents: HashMap<(String, String), Value>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockSearchBackend {
    /// Queue a response for the next `search` call.
    pub fn with_search(self, response: SearchResponse) -> Self {
        lock(&self.searches).push_back(response);
        self
    }

    /// Queue a response for the next `search` call from raw JSON.
    pub fn with_search_json(self, response: Value) -> Self {
        self.with_search(parse(response))
    }

    /// Queue the responses for the next `multi_search` call.
    pub fn with_batch(self, responses: Vec<SearchResponse>) -> Self {
        lock(&self.batches).push_back(responses);
        self
    }

    /// Queue the responses for the next `multi_search` call from raw JSON.
    pub fn with_batch_json(self, responses: Vec<Value>) -> Self {
        self.with_batch(responses.into_iter().map(parse).collect())
    }

    /// Store a document served by `multi_get`.
    pub fn with_document(mut self, index: &str, id: &str, source: Value) -> Self {
        self.documents
            .insert((index.to_string(), id.to_string()), source);
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of `multi_get` calls received so far.
    pub fn multi_get_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, RecordedCall::MultiGet { .. }))
            .count()
    }

    fn record(&self, call: RecordedCall) {
        lock(&self.calls).push(call);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Panics on a fixture that is not a search response.
fn parse(response: Value) -> SearchResponse {
    serde_json::from_value(response).expect("invalid mock response fixture")
}

#[async_trait]
impl SearchBackend for MockSearchBackend {
    async fn search(&self, index: &str, query: &Value) -> Result<SearchResponse> {
        self.record(RecordedCall::Search {
            index: index.to_string(),
            query: query.clone(),
        });
        lock(&self.searches)
            .pop_front()
            .ok_or_else(|| LodError::Backend(format!("no mock response queued for search on {index}")))
    }

    async fn multi_search(&self, index: &str, queries: &[Value]) -> Result<Vec<SearchResponse>> {
        self.record(RecordedCall::MultiSearch {
            index: index.to_string(),
            queries: queries.to_vec(),
        });
        lock(&self.batches).pop_front().ok_or_else(|| {
            LodError::Backend(format!("no mock response queued for multi-search on {index}"))
        })
    }

    async fn multi_get(&self, index: &str, ids: &[String]) -> Result<Vec<GetDocument>> {
        self.record(RecordedCall::MultiGet {
            index: index.to_string(),
            ids: ids.to_vec(),
        });
        Ok(ids
            .iter()
            .map(|id| {
                let source = self.documents.get(&(index.to_string(), id.clone())).cloned();
                GetDocument {
                    id: id.clone(),
                    found: source.is_some(),
                    source,
                }
            })
            .collect())
    }
}
