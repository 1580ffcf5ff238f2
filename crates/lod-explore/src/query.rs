//! Query DSL construction.
//!
//! Pure functions turning subjects and filters into backend query documents.
//! Nothing here performs I/O; the only failure is a caller error such as an
//! empty subject list.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use lod_types::{LodError, Result};

/// Number of top resources returned per (method, subject) query.
pub const DEFAULT_RESULT_WINDOW: usize = 15;

/// Name of the adjacency matrix aggregation in correlation queries.
pub const MATRIX_AGG_NAME: &str = "cooccurrence";

/// Exact-term field naming the topics a resource mentions.
pub const MENTION_NAME_FIELD: &str = "mentions.name.keyword";

/// Weighted fields searched by subject phrase clauses.
pub const RESOURCE_FIELDS: &[&str] = &[
    "preferredName^2",
    "description",
    "alternativeHeadline",
    "nameShort",
    "nameSub",
    "author.name",
    "mentions.name^3",
    "partOfSeries.name",
    "about.name",
    "about.keywords",
];

/// Fields matched by the author filter.
pub const AUTHOR_FIELDS: &[&str] = &["author.name", "contributor.name"];

/// How subjects are matched against resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStrategy {
    /// Phrase match plus an exact mention-name term per subject
    TopicMatch,
    /// Phrase match only
    PhraseMatch,
}

impl MatchStrategy {
    /// Canonical method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::TopicMatch => "topicMatch",
            MatchStrategy::PhraseMatch => "phraseMatch",
        }
    }

    /// Criterion identifying resources about `subject`.
    fn subject_criterion(&self, subject: &str) -> Value {
        match self {
            MatchStrategy::TopicMatch => term_clause(MENTION_NAME_FIELD, subject),
            MatchStrategy::PhraseMatch => phrase_clause(subject, RESOURCE_FIELDS),
        }
    }
}

/// Optional parts of an aggregation query.
#[derive(Debug, Clone, Copy)]
pub struct AggsQueryParams<'a> {
    /// Extra phrase every hit must contain
    pub restriction: Option<&'a str>,
    /// Author/contributor name filter
    pub author_filter: Option<&'a str>,
    /// Number of hits returned
    pub size: usize,
}

impl Default for AggsQueryParams<'_> {
    fn default() -> Self {
        Self {
            restriction: None,
            author_filter: None,
            size: DEFAULT_RESULT_WINDOW,
        }
    }
}

fn phrase_clause(text: &str, fields: &[&str]) -> Value {
    json!({
        "multi_match": {
            "query": text,
            "fields": fields,
            "type": "phrase"
        }
    })
}

fn term_clause(field: &str, value: &str) -> Value {
    json!({ "term": { field: value } })
}

fn require_subjects(subjects: &[String]) -> Result<()> {
    if subjects.is_empty() {
        return Err(LodError::InvalidInput(
            "at least one subject is required".to_string(),
        ));
    }
    Ok(())
}

/// The fixed aggregation block attached to every aggregation query.
pub fn resource_aggregations() -> Value {
    json!({
        "topAuthors": {
            "terms": { "field": "author.@id.keyword", "size": 10 }
        },
        "datePublished": {
            "date_histogram": {
                "field": "datePublished.@value",
                "calendar_interval": "year",
                "min_doc_count": 1,
                "format": "yyyy"
            }
        },
        "mentions": {
            "terms": { "field": "mentions.@id.keyword", "size": 10 }
        },
        "genres": {
            "terms": { "field": "genre.Text.keyword", "size": 20 }
        },
        "topRelatedTopics": {
            "terms": { "field": "mentions.@id.keyword", "include": ".*topics.*", "size": 10 }
        }
    })
}

fn resource_sort() -> Value {
    json!(["_score", { "datePublished.@value": { "order": "desc" } }])
}

/// Aggregation query for `subjects` under `strategy`.
///
/// Every subject becomes a phrase `must` clause; `TopicMatch` additionally
/// filters on the exact mention name of each subject.
pub fn build_aggs_query(
    subjects: &[String],
    strategy: MatchStrategy,
    params: &AggsQueryParams<'_>,
) -> Result<Value> {
    require_subjects(subjects)?;

    let mut must: Vec<Value> = subjects
        .iter()
        .map(|subject| phrase_clause(subject, RESOURCE_FIELDS))
        .collect();
    if let Some(restriction) = params.restriction {
        must.push(phrase_clause(restriction, RESOURCE_FIELDS));
    }

    let mut filter: Vec<Value> = match strategy {
        MatchStrategy::TopicMatch => subjects
            .iter()
            .map(|subject| term_clause(MENTION_NAME_FIELD, subject))
            .collect(),
        MatchStrategy::PhraseMatch => Vec::new(),
    };
    if let Some(author) = params.author_filter {
        filter.push(phrase_clause(author, AUTHOR_FIELDS));
    }

    Ok(json!({
        "size": params.size,
        "track_scores": true,
        "sort": resource_sort(),
        "query": {
            "bool": {
                "must": must,
                "filter": filter
            }
        },
        "aggs": resource_aggregations()
    }))
}

/// Zero-hit query computing pairwise subject co-occurrence.
pub fn build_matrix_query(subjects: &[String], strategy: MatchStrategy) -> Result<Value> {
    require_subjects(subjects)?;

    let filters: Map<String, Value> = subjects
        .iter()
        .map(|subject| (subject.clone(), strategy.subject_criterion(subject)))
        .collect();

    Ok(json!({
        "size": 0,
        "aggs": {
            MATRIX_AGG_NAME: {
                "adjacency_matrix": { "filters": filters }
            }
        }
    }))
}

/// Topic document search over `fields`, starting at offset `from`.
pub fn build_topic_query(
    text: &str,
    size: usize,
    fields: &[String],
    exclude_fields: &[String],
    from: usize,
) -> Value {
    json!({
        "size": size,
        "from": from,
        "_source": { "excludes": exclude_fields },
        "query": {
            "simple_query_string": {
                "query": text,
                "fields": fields,
                "default_operator": "and"
            }
        }
    })
}

/// Zero-hit query counting resources whose `field` references `topic_id`.
pub fn build_mention_count_query(field: &str, topic_id: &str) -> Value {
    json!({
        "size": 0,
        "query": term_clause(field, topic_id)
    })
}

/// Standalone variant of `query` that only counts, exactly.
///
/// Aggregations, sorting and hits are stripped; `track_total_hits` lifts the
/// backend's reporting ceiling.
pub fn build_exact_count_query(query: &Value) -> Value {
    let mut count = match query {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    count.remove("aggs");
    count.remove("aggregations");
    count.remove("sort");
    count.remove("track_scores");
    count.remove("from");
    count.insert("size".to_string(), json!(0));
    count.insert("track_total_hits".to_string(), json!(true));
    Value::Object(count)
}

/// Names of the aggregations `query` asks for.
pub fn requested_aggregations(query: &Value) -> Vec<String> {
    query
        .get("aggs")
        .or_else(|| query.get("aggregations"))
        .and_then(Value::as_object)
        .map(|aggs| aggs.keys().cloned().collect())
        .unwrap_or_default()
}
