//! Tests for the format module

use super::*;
use crate::batch::PreparedBatch;
use crate::config::FormatType;
use crate::schema::{FieldSchema, ListSchema, ScalarKind, SchemaTable};
use ::arrow::array::Array;
use ::arrow::datatypes::{DataType, TimeUnit};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::BTreeMap;

fn prepared(schema: SchemaTable, columns: BTreeMap<String, Vec<Value>>) -> PreparedBatch {
    let row_count = columns.values().next().map_or(0, Vec::len);
    PreparedBatch {
        schema,
        columns,
        row_count,
    }
}

// ============================================================================
// Arrow Type Mapping Tests
// ============================================================================

#[test]
fn test_scalar_data_types() {
    let cases = [
        (ScalarKind::Integer, DataType::Int64),
        (ScalarKind::Float, DataType::Float64),
        (ScalarKind::String, DataType::Utf8),
        (ScalarKind::Boolean, DataType::Boolean),
        (
            ScalarKind::Timestamp,
            DataType::Timestamp(TimeUnit::Microsecond, None),
        ),
        (ScalarKind::Date, DataType::Date32),
        (ScalarKind::Time, DataType::Time64(TimeUnit::Microsecond)),
        (ScalarKind::Null, DataType::Null),
    ];
    for (kind, expected) in cases {
        assert_eq!(
            arrow_data_type(&FieldSchema::scalar(kind)).unwrap(),
            expected
        );
    }
}

#[test]
fn test_list_and_struct_data_types() {
    let list = FieldSchema::list(FieldSchema::scalar(ScalarKind::Integer));
    let DataType::List(item) = arrow_data_type(&list).unwrap() else {
        panic!("expected list");
    };
    assert_eq!(item.data_type(), &DataType::Int64);

    let fields = [("a".to_string(), FieldSchema::scalar(ScalarKind::String))].into();
    let DataType::Struct(children) = arrow_data_type(&FieldSchema::Struct(fields)).unwrap() else {
        panic!("expected struct");
    };
    assert_eq!(children.len(), 1);
}

#[test]
fn test_empty_struct_is_encoding_error() {
    let err = arrow_data_type(&FieldSchema::Struct(BTreeMap::new())).unwrap_err();
    assert!(matches!(err, crate::error::Error::Encoding { .. }));
}

#[test]
fn test_positional_list_degrades_to_utf8() {
    let positional = FieldSchema::List(ListSchema::Positional(
        [
            (0, FieldSchema::scalar(ScalarKind::Integer)),
            (1, FieldSchema::scalar(ScalarKind::String)),
        ]
        .into(),
    ));
    assert_eq!(arrow_data_type(&positional).unwrap(), DataType::Utf8);
}

// ============================================================================
// RecordBatch Construction Tests
// ============================================================================

#[test]
fn test_record_batch_simple() {
    let mut schema = SchemaTable::new();
    schema.insert("id".into(), FieldSchema::scalar(ScalarKind::Integer));
    schema.insert("name".into(), FieldSchema::scalar(ScalarKind::String));

    let columns = BTreeMap::from([
        ("id".to_string(), vec![json!(1), json!(2)]),
        ("name".to_string(), vec![json!("a"), Value::Null]),
    ]);

    let batch = to_record_batch(&schema, &columns, 2).unwrap();
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), 2);

    let names = batch.column_by_name("name").unwrap();
    assert!(!names.is_null(0));
    assert!(names.is_null(1));
}

#[test]
fn test_record_batch_struct_backfills_missing_subfields() {
    let mut schema = SchemaTable::new();
    schema.insert(
        "meta".into(),
        FieldSchema::Struct(
            [
                ("region".to_string(), FieldSchema::scalar(ScalarKind::String)),
                ("zone".to_string(), FieldSchema::scalar(ScalarKind::String)),
            ]
            .into(),
        ),
    );

    let columns = BTreeMap::from([(
        "meta".to_string(),
        vec![
            json!({"region": "us"}),
            json!({"region": "eu", "zone": "a"}),
        ],
    )]);

    let batch = to_record_batch(&schema, &columns, 2).unwrap();
    let metas = batch.column_by_name("meta").unwrap();
    let structs = metas
        .as_any()
        .downcast_ref::<::arrow::array::StructArray>()
        .unwrap();

    let zones = structs.column_by_name("zone").unwrap();
    assert!(zones.is_null(0));
    assert!(!zones.is_null(1));
}

#[test]
fn test_record_batch_list_column() {
    let mut schema = SchemaTable::new();
    schema.insert(
        "ids".into(),
        FieldSchema::list(FieldSchema::scalar(ScalarKind::Integer)),
    );

    let columns = BTreeMap::from([(
        "ids".to_string(),
        vec![json!([1, 2]), Value::Null, json!([3])],
    )]);

    let batch = to_record_batch(&schema, &columns, 3).unwrap();
    let lists = batch.column_by_name("ids").unwrap();
    let lists = lists
        .as_any()
        .downcast_ref::<::arrow::array::ListArray>()
        .unwrap();

    assert_eq!(lists.value(0).len(), 2);
    assert!(lists.is_null(1));
    assert_eq!(lists.value(2).len(), 1);
}

#[test]
fn test_record_batch_temporal_columns() {
    let mut schema = SchemaTable::new();
    schema.insert("ts".into(), FieldSchema::scalar(ScalarKind::Timestamp));
    schema.insert("d".into(), FieldSchema::scalar(ScalarKind::Date));

    let columns = BTreeMap::from([
        ("ts".to_string(), vec![json!("2023-01-05T14:30:00")]),
        ("d".to_string(), vec![json!("2023-01-05")]),
    ]);

    let batch = to_record_batch(&schema, &columns, 1).unwrap();
    let ts = batch.column_by_name("ts").unwrap();
    let ts = ts
        .as_any()
        .downcast_ref::<::arrow::array::TimestampMicrosecondArray>()
        .unwrap();
    assert_eq!(ts.value(0), 1_672_929_000_000_000);

    let d = batch.column_by_name("d").unwrap();
    let d = d
        .as_any()
        .downcast_ref::<::arrow::array::Date32Array>()
        .unwrap();
    // 2023-01-05 is 19362 days after the epoch
    assert_eq!(d.value(0), 19362);
}

#[test]
fn test_record_batch_empty() {
    let schema = SchemaTable::new();
    let batch = to_record_batch(&schema, &BTreeMap::new(), 0).unwrap();
    assert_eq!(batch.num_rows(), 0);
}

// ============================================================================
// Format Implementations
// ============================================================================

#[test]
fn test_parquet_encode_produces_magic_bytes() {
    let mut schema = SchemaTable::new();
    schema.insert("id".into(), FieldSchema::scalar(ScalarKind::Integer));
    let columns = BTreeMap::from([("id".to_string(), vec![json!(1)])]);

    let payload = ParquetFormat::default()
        .encode(&prepared(schema, columns))
        .unwrap();
    assert_eq!(&payload[0..4], b"PAR1");
    assert_eq!(&payload[payload.len() - 4..], b"PAR1");
}

#[test]
fn test_jsonl_encode() {
    let mut schema = SchemaTable::new();
    schema.insert("id".into(), FieldSchema::scalar(ScalarKind::Integer));
    let columns = BTreeMap::from([("id".to_string(), vec![json!(1), json!(2)])]);

    let payload = JsonlFormat.encode(&prepared(schema, columns)).unwrap();
    assert_eq!(payload.as_ref(), b"{\"id\":1}\n{\"id\":2}");
}

#[test]
fn test_json_encode() {
    let mut schema = SchemaTable::new();
    schema.insert("id".into(), FieldSchema::scalar(ScalarKind::Integer));
    let columns = BTreeMap::from([("id".to_string(), vec![json!(1)])]);

    let payload = JsonFormat.encode(&prepared(schema, columns)).unwrap();
    let decoded: Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(decoded, json!([{"id": 1}]));
}

// ============================================================================
// Registry Tests
// ============================================================================

#[test]
fn test_format_by_name() {
    assert_eq!(format_by_name("parquet").unwrap(), FormatType::Parquet);
    assert_eq!(format_by_name("jsonl").unwrap(), FormatType::Jsonl);
    assert!(matches!(
        format_by_name("avro"),
        Err(crate::error::Error::UnknownFormat { .. })
    ));
}

#[test]
fn test_format_extensions() {
    let config = crate::config::SinkConfig::new(FormatType::Parquet, "b");
    assert_eq!(format_for(&config).extension(), "parquet");

    let config = crate::config::SinkConfig::new(FormatType::Jsonl, "b");
    assert_eq!(format_for(&config).extension(), "jsonl");
}
