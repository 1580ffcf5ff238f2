//! Topic search hit types.

use serde::{Deserialize, Serialize};

/// Additional type attached to a topic (e.g. "Geografikum").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A normalized topic search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicHit {
    /// Topic URI
    pub id: String,

    /// Backend relevance score
    pub score: f64,

    /// Preferred name
    pub name: String,

    #[serde(default)]
    pub alternate_name: Vec<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub additional_types: Vec<AdditionalType>,

    /// Number of resources mentioning this topic
    pub mention_count: u64,
}

impl TopicHit {
    /// A hit is valid when at least one resource mentions it.
    pub fn is_valid(&self) -> bool {
        self.mention_count > 0
    }
}
