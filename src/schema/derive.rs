//! Top-down schema derivation from a declared schema
//!
//! Maps an externally supplied JSON-Schema-like type tree (the tap's declared
//! stream schema) into a `SchemaTable`. This schema is authoritative and
//! bypasses bottom-up inference entirely when selected.

use super::types::{FieldSchema, ScalarKind, SchemaTable};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use tracing::warn;

/// Derive a `SchemaTable` from declared top-level properties
pub fn derive(declared_properties: &Map<String, Value>) -> Result<SchemaTable> {
    let mut table = SchemaTable::new();
    for (name, definition) in declared_properties {
        table.insert(name.clone(), derive_property(name, definition, 0)?);
    }
    Ok(table)
}

/// Derive one property definition at the given nesting level
///
/// Only level-0 strings receive datetime kinds from their `format`
/// annotation: upstream coerces top-level datetime fields before this stage,
/// deeper strings never see that treatment.
fn derive_property(name: &str, definition: &Value, level: usize) -> Result<FieldSchema> {
    let Some(type_name) = declared_type(definition) else {
        warn!(
            field = name,
            "declared property has no usable 'type', treating as string"
        );
        return Ok(FieldSchema::Scalar(ScalarKind::String));
    };

    match type_name {
        "integer" => Ok(FieldSchema::Scalar(ScalarKind::Integer)),
        "number" => Ok(FieldSchema::Scalar(ScalarKind::Float)),
        "boolean" => Ok(FieldSchema::Scalar(ScalarKind::Boolean)),
        "null" => Ok(FieldSchema::Scalar(ScalarKind::Null)),
        "string" => {
            let format = definition.get("format").and_then(Value::as_str);
            Ok(FieldSchema::Scalar(match (level, format) {
                (0, Some("date")) => ScalarKind::Date,
                (0, Some("time")) => ScalarKind::Time,
                (0, Some(_)) => ScalarKind::Timestamp,
                _ => ScalarKind::String,
            }))
        }
        "array" => match definition.get("items") {
            Some(items) => {
                // Element schema sits at the same nesting level as the array.
                let element = derive_property(name, items, level)?;
                Ok(FieldSchema::list(element))
            }
            None => {
                warn!(
                    field = name,
                    "declared array has no 'items' definition, element type unknown"
                );
                Ok(FieldSchema::list(FieldSchema::Scalar(ScalarKind::Null)))
            }
        },
        "object" => {
            let properties = definition.get("properties").and_then(Value::as_object);
            match properties {
                Some(props) if !props.is_empty() => {
                    let mut fields = std::collections::BTreeMap::new();
                    for (key, prop) in props {
                        fields.insert(key.clone(), derive_property(key, prop, level + 1)?);
                    }
                    Ok(FieldSchema::Struct(fields))
                }
                _ => {
                    warn!(
                        field = name,
                        "declared object has no properties, will fail at columnar encode"
                    );
                    Ok(FieldSchema::Struct(std::collections::BTreeMap::new()))
                }
            }
        }
        other => Err(Error::derivation(format!(
            "unsupported declared type '{other}' for field '{name}'"
        ))),
    }
}

/// Extract the declared type name, unwrapping `["T", "null"]` unions
///
/// Tap schemas routinely declare nullable fields as a type array; the first
/// non-null entry wins.
fn declared_type(definition: &Value) -> Option<&str> {
    match definition.get("type") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .or_else(|| types.iter().filter_map(Value::as_str).next()),
        _ => None,
    }
}
