//! # lod-explore
//!
//! Topic exploration and aggregation engine for the LOD API.
//!
//! Given a set of subject topic names, the engine:
//! - runs competing query strategies (`topicMatch`, `phraseMatch`) against the
//!   resource corpus and merges per-subject statistics into super-aggregates
//! - computes pairwise subject co-occurrence via adjacency-matrix aggregations
//! - resolves every entity referenced by those results into one normalized,
//!   deduplicated entity pool
//! - searches topic documents while guaranteeing a minimum number of topics
//!   that resources actually mention
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lod_explore::ExploreService;
//! use lod_search::{ElasticBackend, ElasticConfig};
//! use lod_types::{ExploreRequest, Settings};
//!
//! let settings = Arc::new(Settings::load(None)?);
//! let backend = Arc::new(ElasticBackend::new(ElasticConfig::from_settings(&settings))?);
//! let service = ExploreService::new(backend, settings);
//!
//! let result = service.explore(&ExploreRequest::new(["Dresden", "Elbe"])).await?;
//! ```

pub mod aggregation;
pub mod batch;
pub mod entities;
pub mod method;
pub mod parse;
pub mod query;
pub mod queryset;
pub mod service;
pub mod topicsearch;

pub use aggregation::AggregationManager;
pub use batch::{BatchExecutor, BatchResponse, TaggedQuery};
pub use entities::{
    group_uris, split_entity_uri, EntityProjector, EntityResolver, GroupedIds, ProjectorRegistry,
};
pub use method::{AggregationMethod, MethodRegistry};
pub use parse::{leading_year, parse_agg};
pub use query::{
    build_aggs_query, build_matrix_query, build_topic_query, AggsQueryParams, MatchStrategy,
};
pub use queryset::{build_query_set, QueryTag, SUBJECT_PLACEHOLDER};
pub use service::ExploreService;
pub use topicsearch::{normalize_topic_hit, TopicSearchPaginator};
