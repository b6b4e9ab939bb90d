//! Batch preparation and orchestration
//!
//! One `BatchPreparer` invocation owns one batch end to end: flatten,
//! optional process date, schema construction (inferred or declared),
//! validation into a column-major mapping, encode, store. Nothing here is
//! shared across batches; each batch gets a fresh `SchemaTable`.

use crate::config::SinkConfig;
use crate::error::{Error, Result};
use crate::flatten::flatten_record;
use crate::format;
use crate::key::build_key;
use crate::schema::{
    derive, infer, infer_value, merge_field, validate, FieldSchema, ScalarKind, SchemaTable,
};
use crate::sink::ObjectSink;
use chrono::{NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Field appended to every record when `include_process_date` is set
pub const PROCESS_DATE_FIELD: &str = "_PROCESS_DATE";

/// A batch after schema construction and validation
///
/// `columns` is the column-major `{field_name: [values...]}` mapping handed
/// to the encoder; every column holds exactly `row_count` values, with nulls
/// where a record lacked the field (late-discovered fields are backfilled).
#[derive(Debug)]
pub struct PreparedBatch {
    /// Final batch schema, including fields discovered during validation
    pub schema: SchemaTable,
    /// Column-major validated values
    pub columns: BTreeMap<String, Vec<Value>>,
    /// Number of records in the batch
    pub row_count: usize,
}

/// Prepares and writes one batch of records
pub struct BatchPreparer<'a> {
    config: &'a SinkConfig,
    stream_name: String,
    declared_schema: Option<Map<String, Value>>,
}

impl<'a> BatchPreparer<'a> {
    /// Create a preparer for one stream's batch
    pub fn new(config: &'a SinkConfig, stream_name: impl Into<String>) -> Self {
        Self {
            config,
            stream_name: stream_name.into(),
            declared_schema: None,
        }
    }

    /// Attach the tap-declared schema properties
    ///
    /// Used only when `get_schema_from_tap` is set in the configuration.
    #[must_use]
    pub fn with_declared_schema(mut self, properties: Map<String, Value>) -> Self {
        self.declared_schema = Some(properties);
        self
    }

    /// The object key (without extension) for a batch starting at `batch_start`
    pub fn key(&self, batch_start: NaiveDateTime) -> String {
        build_key(batch_start, &self.stream_name, self.config)
    }

    /// Flatten, schema-build and validate a batch into columnar input
    pub fn prepare(&self, records: &[Value]) -> Result<PreparedBatch> {
        self.config.validate()?;

        let mut rows: Vec<Map<String, Value>> = records
            .iter()
            .map(|record| match record {
                Value::Object(map) => Ok(map.clone()),
                other => Err(Error::encoding(format!("record is not an object: {other}"))),
            })
            .collect::<Result<_>>()?;

        if self.config.flatten_records {
            rows = rows.iter().map(flatten_record).collect();
        }

        if self.config.include_process_date {
            let now = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
            for row in &mut rows {
                row.insert(PROCESS_DATE_FIELD.to_string(), Value::String(now.clone()));
            }
        }

        format::format_for(self.config).prepare(&mut rows)?;

        let values: Vec<Value> = rows.into_iter().map(Value::Object).collect();

        let mut schema = self.build_schema(&values)?;
        debug!(
            stream = %self.stream_name,
            fields = schema.len(),
            rows = values.len(),
            "batch schema constructed"
        );

        let columns = self.build_columns(&mut schema, &values)?;

        Ok(PreparedBatch {
            schema,
            columns,
            row_count: values.len(),
        })
    }

    /// Prepare, encode and persist one batch; returns the final object key
    pub async fn run(
        &self,
        batch_start: NaiveDateTime,
        records: &[Value],
        sink: &dyn ObjectSink,
    ) -> Result<String> {
        let prepared = self.prepare(records)?;

        let encoder = format::format_for(self.config);
        let payload = encoder.encode(&prepared)?;

        let key = format!("{}.{}", self.key(batch_start), encoder.extension());
        info!(
            stream = %self.stream_name,
            key = %key,
            rows = prepared.row_count,
            bytes = payload.len(),
            "writing batch"
        );
        sink.store(&key, payload).await?;

        Ok(key)
    }

    fn build_schema(&self, values: &[Value]) -> Result<SchemaTable> {
        if !self.config.get_schema_from_tap {
            return Ok(infer(values));
        }
        match &self.declared_schema {
            Some(properties) => derive(properties),
            None => Err(Error::config(
                "get_schema_from_tap is set but no declared schema was supplied",
            )),
        }
    }

    /// Build the `{field_name: [values...]}` mapping, validating every value
    ///
    /// Columns cover the union of schema fields and record fields, so a field
    /// first seen in a late record still gets a full-length column.
    fn build_columns(
        &self,
        schema: &mut SchemaTable,
        values: &[Value],
    ) -> Result<BTreeMap<String, Vec<Value>>> {
        let mut names: BTreeSet<String> = schema.keys().cloned().collect();
        for value in values {
            if let Value::Object(map) = value {
                names.extend(map.keys().cloned());
            }
        }

        let mut columns = BTreeMap::new();
        for name in names {
            let mut column = Vec::with_capacity(values.len());
            for value in values {
                let item = value.get(name.as_str()).unwrap_or(&Value::Null);
                let validated = if self.config.validate {
                    validate(schema, &name, item)?
                } else {
                    item.clone()
                };
                column.push(validated);
            }
            // Validation adopts unknown fields into the schema as it goes;
            // without it an undeclared field still needs a real type, or the
            // encoder would write its column as all-null.
            if !self.config.validate && !schema.contains_key(&name) {
                let mut inferred = FieldSchema::Scalar(ScalarKind::Null);
                for item in &column {
                    inferred = merge_field(&name, inferred, infer_value(item));
                }
                schema.insert(name.clone(), inferred);
            }
            columns.insert(name, column);
        }
        Ok(columns)
    }
}
