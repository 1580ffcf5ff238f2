//! Aggregation result types.
//!
//! A [`ParsedAggregation`] is the normalized form of one backend bucket list:
//! bucket key to summed document count. Per-subject results are merged into
//! a per-method super-aggregate by elementwise summation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityPool;

/// Normalized bucket list: key -> document count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedAggregation(BTreeMap<String, u64>);

impl ParsedAggregation {
    /// Create an empty aggregation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to `key`, summing with any existing count.
    pub fn add(&mut self, key: impl Into<String>, count: u64) {
        *self.0.entry(key.into()).or_insert(0) += count;
    }

    /// Count for `key`, if present.
    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    /// Elementwise sum of `other` into `self`.
    pub fn merge(&mut self, other: &ParsedAggregation) {
        for (key, count) in &other.0 {
            self.add(key.clone(), *count);
        }
    }

    /// Iterate keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Iterate `(key, count)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.0.iter()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no bucket survived parsing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for ParsedAggregation {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut agg = ParsedAggregation::new();
        for (key, count) in iter {
            agg.add(key, count);
        }
        agg
    }
}

/// Result of one (method, subject) query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    /// Authoritative hit count, corrected when the backend capped it
    pub doc_count: u64,

    /// Parsed aggregations by aggregation name
    pub aggs: BTreeMap<String, ParsedAggregation>,

    /// Top-scoring resource ids with their scores
    pub top_resources: BTreeMap<String, f64>,
}

/// Results of one aggregation method across all subjects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodResult {
    /// Per-subject results
    pub subjects: BTreeMap<String, SubjectResult>,

    /// Elementwise sum of every subject's aggregations, by aggregation name
    pub super_agg: BTreeMap<String, ParsedAggregation>,
}

impl MethodResult {
    /// Recompute `super_agg` from the current subject results.
    pub fn compute_super_agg(&mut self) {
        let mut super_agg: BTreeMap<String, ParsedAggregation> = BTreeMap::new();
        for result in self.subjects.values() {
            for (name, agg) in &result.aggs {
                super_agg.entry(name.clone()).or_default().merge(agg);
            }
        }
        self.super_agg = super_agg;
    }
}

/// Co-occurrence counts: method name -> aggregation name -> combo key -> count.
///
/// A combo key is either a single subject or subjects joined by `&`.
pub type CorrelationResult = BTreeMap<String, BTreeMap<String, ParsedAggregation>>;

/// Everything one exploration request produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreResult {
    /// Results by method name
    pub results: BTreeMap<String, MethodResult>,

    /// Subject co-occurrence, when correlations were requested
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub correlations: CorrelationResult,

    /// Every entity referenced by the results
    pub entity_pool: EntityPool,
}
