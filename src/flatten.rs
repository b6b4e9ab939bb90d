//! Record flattening
//!
//! Converts a nested record into a single-level record by joining nested key
//! paths with `__`. Fields are visited in sorted key order so the output is
//! deterministic regardless of input iteration order, which keeps column
//! ordering stable across batches. List values are serialized to JSON strings
//! rather than exploded into columns.

use serde_json::{Map, Value};

/// Separator joining nested key path segments
pub const SEPARATOR: &str = "__";

/// Flattened keys are kept strictly below this length
pub const MAX_KEY_LENGTH: usize = 255;

/// Flatten a nested record into a single-level record
pub fn flatten_record(record: &Map<String, Value>) -> Map<String, Value> {
    flatten_inner(record, &[], SEPARATOR)
}

fn flatten_inner(record: &Map<String, Value>, parent_path: &[&str], sep: &str) -> Map<String, Value> {
    let mut items = Map::new();

    let mut keys: Vec<&String> = record.keys().collect();
    keys.sort();

    for key in keys {
        let value = &record[key.as_str()];
        match value {
            Value::Object(nested) => {
                let mut path: Vec<&str> = parent_path.to_vec();
                path.push(key);
                for (k, v) in flatten_inner(nested, &path, sep) {
                    items.insert(k, v);
                }
            }
            Value::Array(_) => {
                items.insert(flatten_key(key, parent_path, sep), Value::String(value.to_string()));
            }
            other => {
                items.insert(flatten_key(key, parent_path, sep), other.clone());
            }
        }
    }

    items
}

/// Compose a flat column name from a key path, shortening on collision risk
///
/// While the joined key is at least [`MAX_KEY_LENGTH`] characters and
/// un-shortened segments remain, each segment in turn is abbreviated: strip
/// the lowercase letters from its camel-cased form; if that leaves more than
/// one character use it, otherwise fall back to the segment's first three
/// characters. Either way the replacement is lower-cased. Deterministic for a
/// given path.
pub fn flatten_key(key: &str, parent_path: &[&str], sep: &str) -> String {
    let mut segments: Vec<String> = parent_path
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    segments.push(key.to_string());

    let mut reducer_index = 0;
    while segments.join(sep).len() >= MAX_KEY_LENGTH && reducer_index < segments.len() {
        let original = &segments[reducer_index];
        let reduced = abbreviate(original);
        segments[reducer_index] = if reduced.chars().count() > 1 {
            reduced
        } else {
            original.chars().take(3).collect()
        }
        .to_lowercase();
        reducer_index += 1;
    }

    segments.join(sep)
}

/// Camelize a segment and strip its lowercase letters
///
/// `customer_billing_address` camelizes to `CustomerBillingAddress`, which
/// reduces to `CBA`.
fn abbreviate(segment: &str) -> String {
    let camelized: String = segment
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();

    camelized.chars().filter(|c| !c.is_lowercase()).collect()
}
