//! Batch schema construction and validation
//!
//! One `SchemaTable` per batch, built bottom-up by scanning records
//! ([`infer`]) or top-down from a declared schema ([`derive`]), then used by
//! [`validate`] to coerce every record value.

mod derive;
mod infer;
mod types;
mod validate;

pub use derive::derive;
pub use infer::{infer, infer_value, merge_field};
pub use types::{FieldSchema, ListSchema, ScalarKind, SchemaTable};
pub use validate::{initial_schema, parse_timestamp, validate};
