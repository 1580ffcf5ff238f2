//! # lod-search
//!
//! The search backend contract used by the exploration engine.
//!
//! The engine needs exactly three operations from its backend, each over a
//! JSON document model:
//! - `search`: one query, hits plus optional bucketed aggregations
//! - `multi_search`: an ordered batch of queries answered in the same order
//! - `multi_get`: fetch documents by id
//!
//! [`ElasticBackend`] implements them over HTTP against Elasticsearch;
//! [`MockSearchBackend`] serves canned responses for tests.

pub mod backend;
pub mod elastic;
pub mod mock;
pub mod response;

pub use backend::SearchBackend;
pub use elastic::{ElasticBackend, ElasticConfig};
pub use mock::{MockSearchBackend, RecordedCall};
pub use response::{AggregationResult, Bucket, GetDocument, Hits, SearchHit, SearchResponse, TotalHits};
