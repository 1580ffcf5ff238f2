//! Topic search that guarantees a minimum number of mentioned topics.
//!
//! Topic documents are searched in windows three times the requested size.
//! Every hit in a window gets its mention count looked up in one batch; hits
//! mentioned by at least one resource are valid, the rest are kept as filler.
//! Windows advance until enough valid hits were found, the reported total is
//! exhausted, or a window comes back empty.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use lod_search::{SearchBackend, SearchHit};
use lod_types::{AdditionalType, LodError, Result, Settings, TopicHit, MAX_TOPIC_SIZE};

use crate::batch::{BatchExecutor, TaggedQuery};
use crate::entities::extract::{first_available, opt_string, string_list, string_or};
use crate::query::{build_mention_count_query, build_topic_query};

/// Each window is this many times the requested size.
pub const WINDOW_FACTOR: usize = 3;

/// Normalize a raw topic hit. Hits without an id or name are rejected.
pub fn normalize_topic_hit(hit: &SearchHit) -> Option<TopicHit> {
    let source = &hit.source;
    let id = opt_string(source, &["@id"])?;
    let name = opt_string(source, &["preferredName", "name"])?;

    let additional_types = match first_available(source, &["additionalType"]) {
        Some(Value::Array(items)) => items.iter().filter_map(additional_type).collect(),
        Some(single) => additional_type(single).into_iter().collect(),
        None => Vec::new(),
    };

    Some(TopicHit {
        id,
        score: hit.score.unwrap_or(0.0),
        name,
        alternate_name: string_list(source, &["alternateName"]),
        description: string_or(source, &["description"], ""),
        additional_types,
        mention_count: 0,
    })
}

fn additional_type(value: &Value) -> Option<AdditionalType> {
    Some(AdditionalType {
        id: opt_string(value, &["@id"]),
        name: opt_string(value, &["name"])?,
        description: string_or(value, &["description"], ""),
    })
}

/// Windowed topic search with mention-count validation.
pub struct TopicSearchPaginator<B: SearchBackend + 'static> {
    executor: BatchExecutor<B>,
    settings: Arc<Settings>,
}

impl<B: SearchBackend + 'static> TopicSearchPaginator<B> {
    pub fn new(backend: Arc<B>, settings: Arc<Settings>) -> Self {
        Self {
            executor: BatchExecutor::new(backend, settings.cap_limit),
            settings,
        }
    }

    /// Search topics matching `text`.
    ///
    /// Returns at most `size` hits: valid hits first, then invalid filler.
    /// Empty `fields` fall back to the configured topic fields.
    pub async fn search(&self, text: &str, size: usize, fields: &[String]) -> Result<Vec<TopicHit>> {
        if size == 0 {
            return Err(LodError::InvalidInput("size must be positive".to_string()));
        }
        if size as u64 > MAX_TOPIC_SIZE as u64 {
            return Err(LodError::InvalidInput(format!(
                "size must be at most {MAX_TOPIC_SIZE}, got {size}"
            )));
        }
        let fields = if fields.is_empty() {
            self.settings.topic_fields.as_slice()
        } else {
            fields
        };

        let window = size.saturating_mul(WINDOW_FACTOR);
        let mut from = 0usize;
        let mut iteration = 0usize;
        let mut valid = Vec::new();
        let mut invalid = Vec::new();

        loop {
            iteration += 1;
            if iteration == 2 {
                info!(text, size, "Topic search needs more than one window");
            }

            let query = build_topic_query(text, window, fields, &self.settings.source_excludes, from);
            let response = self
                .executor
                .search(&self.settings.topics_index, &query)
                .await?;
            if response.hits.hits.is_empty() {
                debug!(text, from, "Topic window came back empty");
                break;
            }
            let total = response.total();

            let counted = self.count_mentions(&response.hits.hits).await?;
            for hit in counted {
                if hit.is_valid() {
                    if valid.len() < size {
                        valid.push(hit);
                    }
                } else if invalid.len() < size {
                    invalid.push(hit);
                }
            }

            if valid.len() >= size || from.saturating_add(window) as u64 >= total {
                break;
            }
            from = from.saturating_add(window);
        }

        debug!(
            text,
            iterations = iteration,
            valid = valid.len(),
            invalid = invalid.len(),
            "Topic search finished"
        );
        valid.extend(invalid);
        valid.truncate(size);
        Ok(valid)
    }

    /// Normalize hits and fill in their mention counts with one batch.
    async fn count_mentions(&self, hits: &[SearchHit]) -> Result<Vec<TopicHit>> {
        let queries: Vec<TaggedQuery<TopicHit>> = hits
            .iter()
            .filter_map(|hit| {
                let normalized = normalize_topic_hit(hit);
                if normalized.is_none() {
                    warn!(id = %hit.id, "Skipping topic hit without id or name");
                }
                normalized
            })
            .map(|topic| TaggedQuery {
                query: build_mention_count_query(&self.settings.mention_field, &topic.id),
                tag: topic,
            })
            .collect();

        let counted = self
            .executor
            .run_batch(&self.settings.resources_index, queries)
            .await?;
        Ok(counted
            .into_iter()
            .map(|batch| TopicHit {
                mention_count: batch.doc_count,
                ..batch.tag
            })
            .collect())
    }
}
