//! Schema types
//!
//! The tagged union describing a field's resolved columnar type, and the
//! batch-wide table mapping top-level field names to it. A `SchemaTable` is
//! owned by exactly one batch; it never crosses batch boundaries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Resolved scalar kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Integer,
    Float,
    String,
    Boolean,
    Timestamp,
    Date,
    Time,
    Null,
}

impl ScalarKind {
    /// Classify the runtime type of a scalar JSON value
    ///
    /// Objects and arrays are not scalars; callers handle them first.
    pub fn of_value(value: &Value) -> ScalarKind {
        match value {
            Value::Null => ScalarKind::Null,
            Value::Bool(_) => ScalarKind::Boolean,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    ScalarKind::Integer
                } else {
                    ScalarKind::Float
                }
            }
            _ => ScalarKind::String,
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Timestamp => "timestamp",
            ScalarKind::Date => "date",
            ScalarKind::Time => "time",
            ScalarKind::Null => "null",
        };
        write!(f, "{name}")
    }
}

/// Element layout of a list field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ListSchema {
    /// Homogeneous list: one schema for every element
    Element(Box<FieldSchema>),
    /// Heterogeneous list: one schema per element position
    Positional(BTreeMap<usize, FieldSchema>),
}

/// A node describing one field's resolved type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldSchema {
    Scalar(ScalarKind),
    Struct(BTreeMap<String, FieldSchema>),
    List(ListSchema),
}

impl FieldSchema {
    /// Shorthand for a scalar node
    pub fn scalar(kind: ScalarKind) -> Self {
        FieldSchema::Scalar(kind)
    }

    /// Shorthand for a homogeneous list node
    pub fn list(element: FieldSchema) -> Self {
        FieldSchema::List(ListSchema::Element(Box::new(element)))
    }

    /// Whether this node is the unconstrained null placeholder
    pub fn is_null(&self) -> bool {
        matches!(self, FieldSchema::Scalar(ScalarKind::Null))
    }

    /// Human-readable type name for logs and errors
    pub fn type_name(&self) -> String {
        match self {
            FieldSchema::Scalar(kind) => kind.to_string(),
            FieldSchema::Struct(_) => "struct".to_string(),
            FieldSchema::List(_) => "list".to_string(),
        }
    }
}

/// Mapping from top-level field name to its schema, built once per batch
///
/// Immutable after the inference/derivation phase except for the
/// schema-on-write growth the validator performs.
pub type SchemaTable = BTreeMap<String, FieldSchema>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_kind_of_value() {
        assert_eq!(ScalarKind::of_value(&json!(1)), ScalarKind::Integer);
        assert_eq!(ScalarKind::of_value(&json!(1.5)), ScalarKind::Float);
        assert_eq!(ScalarKind::of_value(&json!("x")), ScalarKind::String);
        assert_eq!(ScalarKind::of_value(&json!(true)), ScalarKind::Boolean);
        assert_eq!(ScalarKind::of_value(&json!(null)), ScalarKind::Null);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(FieldSchema::scalar(ScalarKind::Integer).type_name(), "integer");
        assert_eq!(FieldSchema::Struct(BTreeMap::new()).type_name(), "struct");
        assert_eq!(
            FieldSchema::list(FieldSchema::scalar(ScalarKind::String)).type_name(),
            "list"
        );
    }
}
