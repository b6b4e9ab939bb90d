//! Columnar encoding: `SchemaTable` to Arrow
//!
//! Maps the batch schema to an Arrow schema and the validated column-major
//! value mapping to a `RecordBatch`. Positional (heterogeneous) lists have no
//! Arrow representation and degrade to JSON strings; empty structs are
//! rejected here, after validation has already nulled empty struct values.

use crate::error::{Error, Result};
use crate::schema::{parse_timestamp, FieldSchema, ListSchema, ScalarKind, SchemaTable};
use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, ListArray, NullArray,
    StringArray, StructArray, Time64MicrosecondArray, TimestampMicrosecondArray,
};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field, Fields, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Days from 0001-01-01 (CE) to the Unix epoch
const UNIX_EPOCH_DAY: i32 = 719_163;

/// Map a schema node to its Arrow data type
pub fn arrow_data_type(schema: &FieldSchema) -> Result<DataType> {
    match schema {
        FieldSchema::Scalar(kind) => Ok(match kind {
            ScalarKind::Integer => DataType::Int64,
            ScalarKind::Float => DataType::Float64,
            ScalarKind::String => DataType::Utf8,
            ScalarKind::Boolean => DataType::Boolean,
            ScalarKind::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
            ScalarKind::Date => DataType::Date32,
            ScalarKind::Time => DataType::Time64(TimeUnit::Microsecond),
            ScalarKind::Null => DataType::Null,
        }),
        FieldSchema::Struct(fields) => {
            if fields.is_empty() {
                return Err(Error::encoding(
                    "empty struct is unrepresentable in columnar output",
                ));
            }
            let arrow_fields: Vec<Field> = fields
                .iter()
                .map(|(name, fs)| Ok(Field::new(name, arrow_data_type(fs)?, true)))
                .collect::<Result<_>>()?;
            Ok(DataType::Struct(Fields::from(arrow_fields)))
        }
        FieldSchema::List(ListSchema::Element(element)) => Ok(DataType::List(Arc::new(
            Field::new("item", arrow_data_type(element)?, true),
        ))),
        // No Arrow type holds per-position element types; keep the JSON text.
        FieldSchema::List(ListSchema::Positional(_)) => Ok(DataType::Utf8),
    }
}

/// Build the Arrow schema for a batch, one nullable field per column
pub fn arrow_schema(
    schema_table: &SchemaTable,
    columns: &BTreeMap<String, Vec<Value>>,
) -> Result<Schema> {
    let fields: Vec<Field> = columns
        .keys()
        .map(|name| {
            let field_schema = schema_table
                .get(name)
                .cloned()
                .unwrap_or(FieldSchema::Scalar(ScalarKind::Null));
            Ok(Field::new(name, arrow_data_type(&field_schema)?, true))
        })
        .collect::<Result<_>>()?;
    Ok(Schema::new(fields))
}

/// Convert the validated column mapping to an Arrow `RecordBatch`
pub fn to_record_batch(
    schema_table: &SchemaTable,
    columns: &BTreeMap<String, Vec<Value>>,
    row_count: usize,
) -> Result<RecordBatch> {
    let schema = Arc::new(arrow_schema(schema_table, columns)?);

    if row_count == 0 {
        return Ok(RecordBatch::new_empty(schema));
    }

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
    for field in schema.fields() {
        let column = columns.get(field.name()).ok_or_else(|| {
            Error::encoding(format!("missing column for field '{}'", field.name()))
        })?;
        let values: Vec<Option<&Value>> = column
            .iter()
            .map(|v| if v.is_null() { None } else { Some(v) })
            .collect();
        arrays.push(build_array(&values, field.data_type())?);
    }

    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&Value>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Null => Ok(Arc::new(NullArray::new(values.len()))),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            #[allow(clippy::cast_precision_loss)]
            let arr: Float64Array = values
                .iter()
                .map(|v| v.and_then(|v| v.as_f64().or_else(|| v.as_i64().map(|i| i as f64))))
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.map(|v| match v {
                        Value::String(s) => s.clone(),
                        _ => v.to_string(),
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let arr: TimestampMicrosecondArray = values
                .iter()
                .map(|v| {
                    v.and_then(Value::as_str)
                        .and_then(parse_timestamp)
                        .map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Date32 => {
            let arr: Date32Array = values
                .iter()
                .map(|v| {
                    v.and_then(Value::as_str)
                        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAY)
                })
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Time64(TimeUnit::Microsecond) => {
            let arr: Time64MicrosecondArray = values
                .iter()
                .map(|v| {
                    v.and_then(Value::as_str)
                        .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok())
                        .map(|t| {
                            i64::from(t.num_seconds_from_midnight()) * 1_000_000
                                + i64::from(t.nanosecond() / 1_000)
                        })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::List(field) => build_list_array(values, field),

        DataType::Struct(fields) => build_struct_array(values, fields),

        other => Err(Error::encoding(format!(
            "unsupported arrow type {other} in columnar output"
        ))),
    }
}

/// Build a list array from JSON arrays
fn build_list_array(values: &[Option<&Value>], field: &Arc<Field>) -> Result<ArrayRef> {
    let mut all_items: Vec<Option<&Value>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];

    for value in values {
        if let Some(Value::Array(arr)) = value {
            for item in arr {
                all_items.push(if item.is_null() { None } else { Some(item) });
            }
        }
        // Both array and non-array cases need an offset
        let offset = i32::try_from(all_items.len())
            .map_err(|_| Error::encoding("array too large for i32 offset"))?;
        offsets.push(offset);
    }

    let items_array = build_array(&all_items, field.data_type())?;
    let offset_buffer = OffsetBuffer::new(offsets.into());
    let nulls: arrow::buffer::NullBuffer = values.iter().map(Option::is_some).collect();

    let list_array = ListArray::new(Arc::clone(field), offset_buffer, items_array, Some(nulls));
    Ok(Arc::new(list_array))
}

/// Build a struct array from JSON objects
fn build_struct_array(values: &[Option<&Value>], fields: &Fields) -> Result<ArrayRef> {
    let mut child_arrays: Vec<ArrayRef> = Vec::new();

    for field in fields {
        let child_values: Vec<Option<&Value>> = values
            .iter()
            .map(|v| {
                v.and_then(|v| {
                    if let Value::Object(obj) = v {
                        obj.get(field.name()).filter(|c| !c.is_null())
                    } else {
                        None
                    }
                })
            })
            .collect();

        child_arrays.push(build_array(&child_values, field.data_type())?);
    }

    let nulls: arrow::buffer::NullBuffer = values.iter().map(Option::is_some).collect();
    let struct_array = StructArray::new(fields.clone(), child_arrays, Some(nulls));
    Ok(Arc::new(struct_array))
}
