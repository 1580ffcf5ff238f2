//! Inbound request contract.
//!
//! These are the shapes the HTTP layer hands to the exploration engine.
//! `validate()` enforces the caller-error rules before any backend call is made.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LodError, Result};

/// Aggregation / correlation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreRequest {
    /// Topic names to aggregate over
    pub subjects: Vec<String>,

    /// Extra phrase every matching resource must contain
    #[serde(default)]
    pub restriction: Option<String>,

    /// Restrict resources to those whose author/contributor matches
    #[serde(default)]
    pub author_filter: Option<String>,

    /// Number of top resources returned per subject
    #[serde(default)]
    pub size: Option<i64>,

    /// Raw query per method name, with the subject placeholder token
    #[serde(default)]
    pub query_template: Option<BTreeMap<String, serde_json::Value>>,
}

impl ExploreRequest {
    /// Create a request for the given subjects.
    pub fn new<S: Into<String>>(subjects: impl IntoIterator<Item = S>) -> Self {
        Self {
            subjects: subjects.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the restriction phrase.
    pub fn with_restriction(mut self, restriction: impl Into<String>) -> Self {
        self.restriction = Some(restriction.into());
        self
    }

    /// Set the author filter.
    pub fn with_author_filter(mut self, author: impl Into<String>) -> Self {
        self.author_filter = Some(author.into());
        self
    }

    /// Reject requests that cannot be executed.
    pub fn validate(&self) -> Result<()> {
        if self.subjects.is_empty() {
            return Err(LodError::InvalidInput(
                "subjects must contain at least one topic".to_string(),
            ));
        }
        if self.subjects.iter().any(|s| s.trim().is_empty()) {
            return Err(LodError::InvalidInput(
                "subjects must not contain empty names".to_string(),
            ));
        }
        if let Some(size) = self.size {
            if size <= 0 {
                return Err(LodError::InvalidInput(format!(
                    "size must be positive, got {size}"
                )));
            }
        }
        Ok(())
    }

    /// Validated result window, if the caller asked for one.
    pub fn window(&self) -> Option<usize> {
        self.size.and_then(|s| usize::try_from(s).ok())
    }
}

/// Plain topic search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSearchRequest {
    /// Query text
    pub text: String,

    /// Number of topics requested
    #[serde(default = "default_topic_size")]
    pub size: i64,

    /// Fields to search; configured defaults when empty
    #[serde(default)]
    pub fields: Vec<String>,
}

fn default_topic_size() -> i64 {
    15
}

/// Largest topic search size. Three windows of this size stay within the
/// backend's default result window of 10000.
pub const MAX_TOPIC_SIZE: i64 = 3_333;

impl TopicSearchRequest {
    /// Create a request with the default size.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: default_topic_size(),
            fields: Vec::new(),
        }
    }

    /// Override the number of requested topics.
    pub fn with_size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    /// Reject requests that cannot be executed.
    pub fn validate(&self) -> Result<usize> {
        if self.text.trim().is_empty() {
            return Err(LodError::InvalidInput("text must not be empty".to_string()));
        }
        if self.size > MAX_TOPIC_SIZE {
            return Err(LodError::InvalidInput(format!(
                "size must be at most {MAX_TOPIC_SIZE}, got {}",
                self.size
            )));
        }
        usize::try_from(self.size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                LodError::InvalidInput(format!("size must be positive, got {}", self.size))
            })
    }
}
