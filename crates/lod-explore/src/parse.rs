//! Bucket list normalization.

use serde_json::Value;

use lod_search::{Bucket, SearchResponse};
use lod_types::{LodError, ParsedAggregation, Result};

use crate::query::requested_aggregations;

/// Leading year token of a date string ("1937-06-08" -> "1937").
///
/// A leading `-` marks a year before the common era and is kept
/// ("-0500-01-01" -> "-0500"). Strings without a separator after the year
/// are returned unchanged.
pub fn leading_year(date: &str) -> &str {
    let sign = usize::from(date.starts_with('-'));
    match date[sign..].find('-') {
        Some(end) if end > 0 => &date[..sign + end],
        _ => date,
    }
}

/// Normalized key of a bucket: `key_as_string` truncated to its year, else `key`.
pub fn bucket_key(bucket: &Bucket) -> String {
    if let Some(key) = &bucket.key_as_string {
        return leading_year(key).to_string();
    }
    match &bucket.key {
        Value::String(key) => key.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse a bucket list, summing counts of buckets that normalize to the same key.
///
/// Adjacency matrix keys (`"A"`, `"A&B"`) pass through unchanged.
pub fn parse_agg(buckets: &[Bucket]) -> ParsedAggregation {
    buckets
        .iter()
        .map(|bucket| (bucket_key(bucket), bucket.doc_count))
        .collect()
}

/// Fail if `response` lacks an aggregation that `query` requested.
pub fn ensure_aggregations(query: &Value, response: &SearchResponse) -> Result<()> {
    for name in requested_aggregations(query) {
        if response.aggregation(&name).is_none() {
            return Err(LodError::MissingAggregation { name });
        }
    }
    Ok(())
}
