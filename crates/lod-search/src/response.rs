//! Typed view of backend responses.
//!
//! Only the parts the exploration engine reads are modelled; unknown fields
//! are ignored. `hits.total` is accepted both as a bare integer and as the
//! `{value, relation}` object newer Elasticsearch versions return.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Total hit count as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    /// Pre-7 format: a bare integer
    Count(u64),
    /// 7+ format: `{"value": n, "relation": "eq" | "gte"}`
    Object {
        /// Reported count
        value: u64,
    },
}

impl TotalHits {
    /// Reported count regardless of format.
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(value) | TotalHits::Object { value } => *value,
        }
    }
}

impl Default for TotalHits {
    fn default() -> Self {
        TotalHits::Count(0)
    }
}

/// A single hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_index", default)]
    pub index: String,

    /// Null when the query sorted without tracking scores
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,

    #[serde(rename = "_source", default)]
    pub source: Value,
}

/// The `hits` envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: TotalHits,

    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// One bucket of a terms, date histogram or adjacency matrix aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// String for terms/adjacency buckets, epoch millis for date buckets
    #[serde(default)]
    pub key: Value,

    #[serde(default)]
    pub key_as_string: Option<String>,

    pub doc_count: u64,
}

/// A bucketed aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// Response to a single search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Hits,

    #[serde(default)]
    pub aggregations: Option<BTreeMap<String, AggregationResult>>,
}

impl SearchResponse {
    /// Reported total hit count.
    pub fn total(&self) -> u64 {
        self.hits.total.value()
    }

    /// Look up an aggregation by name.
    pub fn aggregation(&self, name: &str) -> Option<&AggregationResult> {
        self.aggregations.as_ref()?.get(name)
    }
}

/// One document of a multi-get response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetDocument {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub found: bool,

    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
}

/// Envelope of a multi-get response.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MultiGetResponse {
    #[serde(default)]
    pub docs: Vec<GetDocument>,
}

/// Envelope of a multi-search response; items are parsed one by one.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MultiSearchResponse {
    #[serde(default)]
    pub responses: Vec<Value>,
}
