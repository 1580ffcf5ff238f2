//! Default-filling field extraction from raw documents.
//!
//! Paths use `>` as separator; numeric segments index into lists
//! (`"author>0>name"`). A missing segment or a `null` value counts as absent.

use serde_json::Value;

use lod_types::EntityRef;

/// Resolve a `>`-separated path inside `doc`.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('>') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!current.is_null()).then_some(current)
}

/// First candidate path present in `doc`.
pub fn first_available<'a>(doc: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| lookup(doc, path))
}

/// Scalar text of a value: strings as-is, numbers and booleans formatted,
/// lists by their first textual element, `{"@value": ..}` objects unwrapped.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.iter().find_map(as_text),
        Value::Object(map) => map.get("@value").and_then(as_text),
        Value::Null => None,
    }
}

/// First available path as text, if any.
pub fn opt_string(doc: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| lookup(doc, path))
        .find_map(as_text)
}

/// First available path as text, or `default`.
pub fn string_or(doc: &Value, paths: &[&str], default: &str) -> String {
    opt_string(doc, paths).unwrap_or_else(|| default.to_string())
}

/// First available path as a list of names.
///
/// Plain strings are kept; objects contribute their `name`, `Text` or
/// `@value`. Objects carrying none of these are dropped.
pub fn string_list(doc: &Value, paths: &[&str]) -> Vec<String> {
    let Some(value) = first_available(doc, paths) else {
        return Vec::new();
    };
    let items = match value {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => ["name", "Text", "@value"]
                .iter()
                .find_map(|key| map.get(*key).and_then(as_text)),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// First available path as a list of entity references.
///
/// Objects yield `{@id, name}`; strings are taken as ids. Entries with neither
/// an id nor a name are dropped.
pub fn entity_refs(doc: &Value, paths: &[&str]) -> Vec<EntityRef> {
    let Some(value) = first_available(doc, paths) else {
        return Vec::new();
    };
    let items = match value {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(id) => Some(EntityRef {
                id: id.clone(),
                name: String::new(),
            }),
            Value::Object(_) => Some(EntityRef {
                id: string_or(item, &["@id", "id"], ""),
                name: string_or(item, &["name", "preferredName"], ""),
            }),
            _ => None,
        })
        .filter(|r| !r.id.is_empty() || !r.name.is_empty())
        .collect()
}

/// First available path as a float; numeric strings are parsed.
pub fn opt_f64(doc: &Value, paths: &[&str]) -> Option<f64> {
    paths
        .iter()
        .filter_map(|path| lookup(doc, path))
        .find_map(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}
