//! JSON flattening into dot-notation records.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// A single-level projection of a nested JSON value.
///
/// Keys are dotted paths (`title.rendered`), values are the stringified leaf.
pub type FlatRecord = BTreeMap<String, String>;

/// Keys the REST API uses purely for hypermedia metadata.
pub const EXCLUDED_KEYS: &[&str] = &["_links", "_embedded"];

/// Separator used when an array is collapsed into one cell.
pub const ARRAY_DELIMITER: &str = " | ";

/// Flatten a JSON value into a map of dot-notation keys to string values.
///
/// Nested objects use dot notation (e.g. `"title.rendered"`). Arrays are not
/// expanded by index; their elements are stringified and joined with
/// [`ARRAY_DELIMITER`] so the field set does not depend on array length.
/// Values that are not objects at the root have no field name and yield an
/// empty record.
pub fn flatten(value: &Value) -> FlatRecord {
    let mut result = BTreeMap::new();
    if let Value::Object(map) = value {
        flatten_object_ref(map, "", &mut result);
    }
    result
}

fn flatten_object_ref(map: &Map<String, Value>, prefix: &str, result: &mut FlatRecord) {
    for (key, value) in map {
        if EXCLUDED_KEYS.contains(&key.as_str()) {
            continue;
        }

        // Avoid allocation for top-level keys (empty prefix)
        let new_key: Cow<str> = if prefix.is_empty() {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(format!("{prefix}.{key}"))
        };

        flatten_value_ref(value, &new_key, result);
    }
}

fn flatten_value_ref(value: &Value, key: &str, result: &mut FlatRecord) {
    match value {
        Value::Object(map) => flatten_object_ref(map, key, result),
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(array_element_to_string)
                .collect::<Vec<_>>()
                .join(ARRAY_DELIMITER);
            result.insert(key.to_string(), joined);
        }
        scalar => {
            result.insert(key.to_string(), scalar_to_string(scalar));
        }
    }
}

/// Stringify a scalar; `null` becomes the empty string.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Array elements: scalars as-is, containers as compact JSON.
fn array_element_to_string(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => value.to_string(),
        scalar => scalar_to_string(scalar),
    }
}

/// Project a flat record onto an ordered field list.
///
/// Missing fields become empty strings; fields not listed are dropped.
pub fn select_fields(record: &FlatRecord, fields: &[String]) -> Vec<String> {
    fields
        .iter()
        .map(|field| record.get(field).cloned().unwrap_or_default())
        .collect()
}
