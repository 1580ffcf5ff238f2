//! The backend trait.

use async_trait::async_trait;
use serde_json::Value;

use lod_types::Result;

use crate::response::{GetDocument, SearchResponse};

/// Operations the exploration engine requires from a search backend.
///
/// Implementations must answer `multi_search` with exactly one response per
/// query, in query order. Callers re-associate responses by position.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a single query against `index`.
    async fn search(&self, index: &str, query: &Value) -> Result<SearchResponse>;

    /// Run an ordered batch of queries against `index` in one round-trip.
    async fn multi_search(&self, index: &str, queries: &[Value]) -> Result<Vec<SearchResponse>>;

    /// Fetch documents of `index` by id. Missing documents come back with `found == false`.
    async fn multi_get(&self, index: &str, ids: &[String]) -> Result<Vec<GetDocument>>;
}
