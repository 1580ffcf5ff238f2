//! # lod-types
//!
//! Shared domain types for the LOD exploration API.
//!
//! This crate defines the data structures passed between the search backend,
//! the exploration engine and the outer layers:
//! - Aggregations: parsed buckets, per-subject and per-method results, correlations
//! - Entities: normalized projections of linked-data documents and the entity pool
//! - Topics: normalized topic search hits
//! - Requests: the inbound contract of aggregation and topic search calls
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use lod_types::{ParsedAggregation, MethodResult};
//!
//! let mut agg = ParsedAggregation::new();
//! agg.add("1937", 12);
//! assert_eq!(agg.get("1937"), Some(12));
//! let _result = MethodResult::default();
//! ```

pub mod aggregation;
pub mod config;
pub mod entity;
pub mod error;
pub mod request;
pub mod topic;

pub use aggregation::{
    CorrelationResult, ExploreResult, MethodResult, ParsedAggregation, SubjectResult,
};
pub use config::Settings;
pub use entity::{
    EntityPool, EntityRef, EventEntity, NormalizedEntity, OrganizationEntity, PersonEntity,
    PlaceEntity, ResourceEntity, TopicEntity, WorkEntity, RESOURCES_COLLECTION,
};
pub use error::{LodError, Result};
pub use request::{ExploreRequest, TopicSearchRequest, MAX_TOPIC_SIZE};
pub use topic::{AdditionalType, TopicHit};
