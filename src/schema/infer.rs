//! Bottom-up schema inference
//!
//! Scans every record of a batch and unifies a single `SchemaTable`.
//! Conflicts are resolved by policy rather than silently ignored: a field
//! that mixes struct and non-struct values across records degrades to a
//! string classification (information loss is intentional), while scalar
//! type drift keeps the first-seen type and leaves the cast to the
//! validator.

use super::types::{FieldSchema, ListSchema, ScalarKind, SchemaTable};
use serde_json::Value;
use tracing::warn;

/// Infer a batch-wide schema from a set of records
///
/// Non-object records contribute nothing; a field absent from a record is
/// simply not visited for that record.
pub fn infer(records: &[Value]) -> SchemaTable {
    let mut table = SchemaTable::new();

    for record in records {
        if let Value::Object(map) = record {
            for (name, value) in map {
                let incoming = infer_value(value);
                match table.remove(name) {
                    None => {
                        table.insert(name.clone(), incoming);
                    }
                    Some(existing) => {
                        table.insert(name.clone(), merge_field(name, existing, incoming));
                    }
                }
            }
        }
    }

    table
}

/// Classify a single value's runtime type as a schema node
pub fn infer_value(value: &Value) -> FieldSchema {
    match value {
        Value::Object(map) => {
            if map.is_empty() {
                // An empty struct is unrepresentable in the columnar output;
                // it counts as a null entry until a real struct shows up.
                return FieldSchema::Scalar(ScalarKind::Null);
            }
            let fields = map
                .iter()
                .map(|(k, v)| (k.clone(), infer_value(v)))
                .collect();
            FieldSchema::Struct(fields)
        }
        Value::Array(items) => {
            let mut element = FieldSchema::Scalar(ScalarKind::Null);
            for item in items {
                element = merge_field("<element>", element, infer_value(item));
            }
            FieldSchema::list(element)
        }
        scalar => FieldSchema::Scalar(ScalarKind::of_value(scalar)),
    }
}

/// Merge a field's running schema with the classification of a later value
pub fn merge_field(name: &str, existing: FieldSchema, incoming: FieldSchema) -> FieldSchema {
    match (existing, incoming) {
        (a, b) if a == b => a,

        // A null placeholder (absent / empty struct so far) is re-established
        // by whatever real type arrives; nulls never demote a known type.
        (FieldSchema::Scalar(ScalarKind::Null), other)
        | (other, FieldSchema::Scalar(ScalarKind::Null)) => other,

        (FieldSchema::Struct(mut a), FieldSchema::Struct(b)) => {
            for (key, b_field) in b {
                match a.remove(&key) {
                    None => {
                        a.insert(key, b_field);
                    }
                    Some(a_field) => {
                        let merged = merge_field(&key, a_field, b_field);
                        a.insert(key, merged);
                    }
                }
            }
            FieldSchema::Struct(a)
        }

        (FieldSchema::List(ListSchema::Element(a)), FieldSchema::List(ListSchema::Element(b))) => {
            FieldSchema::list(merge_field(name, *a, *b))
        }

        // Mixed struct/non-struct across the batch cannot be unified into
        // one columnar type; availability wins over strict typing.
        (a @ (FieldSchema::Struct(_) | FieldSchema::List(_)), b)
        | (a, b @ (FieldSchema::Struct(_) | FieldSchema::List(_))) => {
            warn!(
                field = name,
                first = %a.type_name(),
                later = %b.type_name(),
                "type conflict across records, downgrading field to string"
            );
            FieldSchema::Scalar(ScalarKind::String)
        }

        (FieldSchema::Scalar(a), FieldSchema::Scalar(b)) => {
            warn!(
                field = name,
                first = %a,
                later = %b,
                "scalar type conflict across records, keeping first-seen type"
            );
            FieldSchema::Scalar(a)
        }
    }
}
