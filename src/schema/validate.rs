//! Record validation and coercion
//!
//! Reconciles every record value against the batch schema, whichever way the
//! schema was produced. The table is a single-owner mutable accumulator for
//! one batch: unknown fields and sub-fields are added as they are observed
//! (schema grows monotonically, never shrinks), and values that disagree
//! with the recorded type are cast to it or rejected.

use super::infer::{infer_value, merge_field};
use super::types::{FieldSchema, ListSchema, ScalarKind, SchemaTable};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{json, Map, Value};

/// Validate one top-level field of one record against the batch schema
///
/// Applies, in order: empty-struct nulling, struct recursion, element-wise
/// list recursion, scalar casting, and schema-on-write adoption of unknown
/// fields.
pub fn validate(schema: &mut SchemaTable, field: &str, value: &Value) -> Result<Value> {
    let slot = schema
        .entry(field.to_string())
        .or_insert_with(|| initial_schema(value));
    validate_value(slot, field, value)
}

/// First-observation schema for a value (schema-on-write)
///
/// Arrays whose elements disagree on type become positional (index-keyed)
/// list schemas instead of a single element schema.
pub fn initial_schema(value: &Value) -> FieldSchema {
    let Value::Array(items) = value else {
        return infer_value(value);
    };
    if items.is_empty() {
        return FieldSchema::list(FieldSchema::Scalar(ScalarKind::Null));
    }

    let schemas: Vec<FieldSchema> = items.iter().map(infer_value).collect();
    if is_heterogeneous(&schemas) {
        return FieldSchema::List(ListSchema::Positional(
            schemas.into_iter().enumerate().collect(),
        ));
    }

    let mut element = FieldSchema::Scalar(ScalarKind::Null);
    for schema in schemas {
        element = merge_field("<element>", element, schema);
    }
    FieldSchema::list(element)
}

/// Whether list elements disagree on type (nulls excluded)
fn is_heterogeneous(schemas: &[FieldSchema]) -> bool {
    let mut non_null = schemas.iter().filter(|s| !s.is_null());
    let Some(first) = non_null.next() else {
        return false;
    };
    non_null.any(|s| {
        std::mem::discriminant(s) != std::mem::discriminant(first)
            || matches!(
                (s, first),
                (FieldSchema::Scalar(a), FieldSchema::Scalar(b)) if a != b
            )
    })
}

fn validate_value(slot: &mut FieldSchema, path: &str, value: &Value) -> Result<Value> {
    // The columnar format cannot represent an empty struct.
    if let Value::Object(map) = value {
        if map.is_empty() {
            return Ok(Value::Null);
        }
    }
    if value.is_null() {
        return Ok(Value::Null);
    }
    // A null placeholder is fixed to the first real type observed.
    if slot.is_null() {
        *slot = initial_schema(value);
    }

    match (&mut *slot, value) {
        (FieldSchema::Struct(fields), Value::Object(map)) => {
            let mut out = Map::new();
            for (key, v) in map {
                let child = fields
                    .entry(key.clone())
                    .or_insert_with(|| initial_schema(v));
                let child_path = format!("{path}.{key}");
                out.insert(key.clone(), validate_value(child, &child_path, v)?);
            }
            Ok(Value::Object(out))
        }

        (FieldSchema::List(list), Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            match list {
                ListSchema::Element(element) => {
                    for (i, item) in items.iter().enumerate() {
                        out.push(validate_value(element, &format!("{path}[{i}]"), item)?);
                    }
                }
                ListSchema::Positional(by_index) => {
                    for (i, item) in items.iter().enumerate() {
                        let child = by_index.entry(i).or_insert_with(|| initial_schema(item));
                        out.push(validate_value(child, &format!("{path}[{i}]"), item)?);
                    }
                }
            }
            Ok(Value::Array(out))
        }

        (FieldSchema::Scalar(kind), actual) => coerce(path, *kind, actual),

        (expected, actual) => Err(Error::coercion(path, expected.type_name(), actual)),
    }
}

/// Cast a value to the schema-expected scalar kind
///
/// A failed cast is a coercion error surfaced to the caller, never silently
/// swallowed: one mis-typed value corrupts the whole column.
fn coerce(path: &str, kind: ScalarKind, value: &Value) -> Result<Value> {
    let mismatch = || Error::coercion(path, kind.to_string(), value);

    match kind {
        ScalarKind::Null => Ok(value.clone()),

        ScalarKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => {
                let f = n.as_f64().ok_or_else(mismatch)?;
                if f.fract() == 0.0 {
                    Ok(json!(f as i64))
                } else {
                    Err(mismatch())
                }
            }
            Value::Bool(b) => Ok(json!(i64::from(*b))),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| json!(i))
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },

        ScalarKind::Float => match value {
            Value::Number(n) => n.as_f64().map(|f| json!(f)).ok_or_else(mismatch),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|f| json!(f))
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },

        ScalarKind::String => match value {
            Value::String(_) => Ok(value.clone()),
            other => Ok(Value::String(other.to_string())),
        },

        ScalarKind::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(json!(true)),
                "false" | "0" => Ok(json!(false)),
                _ => Err(mismatch()),
            },
            Value::Number(n) => match n.as_i64() {
                Some(1) => Ok(json!(true)),
                Some(0) => Ok(json!(false)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },

        ScalarKind::Timestamp => match value {
            Value::String(s) if parse_timestamp(s).is_some() => Ok(value.clone()),
            _ => Err(mismatch()),
        },

        ScalarKind::Date => match value {
            Value::String(s) if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => {
                Ok(value.clone())
            }
            _ => Err(mismatch()),
        },

        ScalarKind::Time => match value {
            Value::String(s) if NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok() => {
                Ok(value.clone())
            }
            _ => Err(mismatch()),
        },
    }
}

/// Parse a timestamp string in the accepted wire formats
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    None
}
