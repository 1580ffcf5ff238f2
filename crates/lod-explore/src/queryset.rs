//! Tagged, ordered query lists for the (method, subject) cross product.
//!
//! Whether queries come from the query builder or from a caller-supplied
//! template, the result is the same: one [`TaggedQuery`] per (method, subject)
//! pair in registry-then-subject order, each carrying its own tag so responses
//! can be re-associated without re-deriving loop positions.

use std::collections::BTreeMap;

use serde_json::Value;

use lod_types::{LodError, Result};

use crate::batch::TaggedQuery;
use crate::method::MethodRegistry;
use crate::query::{build_aggs_query, AggsQueryParams};

/// Placeholder substituted with the subject in template queries.
pub const SUBJECT_PLACEHOLDER: &str = "{{subject}}";

/// Identifies the (method, subject) pair a query was built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryTag {
    pub method: String,
    pub subject: String,
}

/// Build the tagged query list.
///
/// Without a template every registered method is built for every subject.
/// With a template only the methods it names are run, in registry order; a
/// template naming an unregistered method is rejected before anything runs.
pub fn build_query_set(
    methods: &MethodRegistry,
    subjects: &[String],
    template: Option<&BTreeMap<String, Value>>,
    params: &AggsQueryParams<'_>,
) -> Result<Vec<TaggedQuery<QueryTag>>> {
    if subjects.is_empty() {
        return Err(LodError::InvalidInput(
            "at least one subject is required".to_string(),
        ));
    }

    if let Some(template) = template {
        if let Some(unknown) = template.keys().find(|name| methods.get(name).is_none()) {
            return Err(LodError::UnknownMethod(unknown.clone()));
        }
    }

    let mut queries = Vec::with_capacity(methods.len() * subjects.len());
    for method in methods.iter() {
        let raw = match template {
            Some(template) => match template.get(&method.name) {
                Some(raw) => Some(raw),
                None => continue,
            },
            None => None,
        };

        for subject in subjects {
            let query = match raw {
                Some(raw) => substitute_subject(raw, subject),
                None => build_aggs_query(std::slice::from_ref(subject), method.strategy, params)?,
            };
            queries.push(TaggedQuery {
                tag: QueryTag {
                    method: method.name.clone(),
                    subject: subject.clone(),
                },
                query,
            });
        }
    }
    Ok(queries)
}

/// Replace every occurrence of the placeholder in keys and string values.
pub fn substitute_subject(template: &Value, subject: &str) -> Value {
    match template {
        Value::String(s) => Value::String(s.replace(SUBJECT_PLACEHOLDER, subject)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute_subject(item, subject))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    (
                        key.replace(SUBJECT_PLACEHOLDER, subject),
                        substitute_subject(value, subject),
                    )
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn subjects() -> Vec<String> {
        vec!["Dresden".to_string(), "Elbe".to_string()]
    }

    #[test]
    fn test_builder_order_is_method_then_subject() {
        let queries = build_query_set(
            &MethodRegistry::standard(),
            &subjects(),
            None,
            &AggsQueryParams::default(),
        )
        .unwrap();

        let tags: Vec<(&str, &str)> = queries
            .iter()
            .map(|q| (q.tag.method.as_str(), q.tag.subject.as_str()))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("topicMatch", "Dresden"),
                ("topicMatch", "Elbe"),
                ("phraseMatch", "Dresden"),
                ("phraseMatch", "Elbe"),
            ]
        );
        assert_eq!(
            queries[1].query["query"]["bool"]["must"][0]["multi_match"]["query"],
            "Elbe"
        );
    }

    #[test]
    fn test_template_substitution() {
        let template = BTreeMap::from([(
            "phraseMatch".to_string(),
            json!({
                "size": 3,
                "query": {"match_phrase": {"mentions.name": "{{subject}}"}},
                "aggs": {"{{subject}}-genres": {"terms": {"field": "genre.Text.keyword"}}}
            }),
        )]);

        let queries = build_query_set(
            &MethodRegistry::standard(),
            &subjects(),
            Some(&template),
            &AggsQueryParams::default(),
        )
        .unwrap();

        assert_eq!(queries.len(), 2);
        assert!(queries.iter().all(|q| q.tag.method == "phraseMatch"));
        assert_eq!(queries[1].query["query"]["match_phrase"]["mentions.name"], "Elbe");
        assert!(queries[0].query["aggs"].get("Dresden-genres").is_some());
        assert_eq!(queries[0].query["size"], 3);
    }

    #[test]
    fn test_template_with_unknown_method_rejected() {
        let template = BTreeMap::from([("fuzzyMatch".to_string(), json!({}))]);
        let err = build_query_set(
            &MethodRegistry::standard(),
            &subjects(),
            Some(&template),
            &AggsQueryParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LodError::UnknownMethod(ref name) if name == "fuzzyMatch"));
        assert!(err.is_client_error());
    }
}
