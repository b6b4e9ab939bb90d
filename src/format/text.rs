//! JSON and JSONL text formats
//!
//! Trivial string renditions of a prepared batch, kept for contrast with the
//! columnar path. Rows are reconstructed from the validated column mapping so
//! both paths observe the same coerced values.

use super::Format;
use crate::batch::PreparedBatch;
use crate::error::Result;
use bytes::Bytes;
use serde_json::{Map, Value};

/// Rebuild row-major records from the column-major mapping
fn rows(batch: &PreparedBatch) -> Vec<Value> {
    (0..batch.row_count)
        .map(|i| {
            let record: Map<String, Value> = batch
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column[i].clone()))
                .collect();
            Value::Object(record)
        })
        .collect()
}

/// Whole-batch JSON array
pub struct JsonFormat;

impl Format for JsonFormat {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn encode(&self, batch: &PreparedBatch) -> Result<Bytes> {
        let payload = serde_json::to_vec(&Value::Array(rows(batch)))?;
        Ok(Bytes::from(payload))
    }
}

/// Newline-delimited JSON, one record per line
pub struct JsonlFormat;

impl Format for JsonlFormat {
    fn extension(&self) -> &'static str {
        "jsonl"
    }

    fn encode(&self, batch: &PreparedBatch) -> Result<Bytes> {
        let lines: Vec<String> = rows(batch).iter().map(Value::to_string).collect();
        Ok(Bytes::from(lines.join("\n")))
    }
}
