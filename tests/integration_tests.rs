//! End-to-end tests: prepare a batch, encode it, store it, read it back.

use bytes::Bytes;
use chrono::NaiveDateTime;
use lakesink::{
    BatchPreparer, DateGrain, FormatType, MemorySink, ObjectSink, ObjectStoreSink, SinkConfig,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::json;

fn batch_start() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2023, 1, 5)
        .unwrap()
        .and_hms_micro_opt(14, 30, 0, 123_456)
        .unwrap()
}

fn partitioned_config(format: FormatType) -> SinkConfig {
    let mut config = SinkConfig::new(format, "test-bucket");
    config.prefix = "raw".to_string();
    config.append_date_to_prefix = true;
    config.append_date_to_prefix_grain = DateGrain::Day;
    config.partition_name_enabled = true;
    config.append_date_to_filename = true;
    config.append_date_to_filename_grain = DateGrain::Hour;
    config
}

#[tokio::test]
async fn test_parquet_batch_roundtrip() {
    let config = partitioned_config(FormatType::Parquet);
    let sink = MemorySink::new();

    let records = vec![
        json!({"id": 1, "meta": {"region": "us"}}),
        json!({"id": 2, "meta": {"region": "eu", "zone": "a"}}),
    ];

    let key = BatchPreparer::new(&config, "orders")
        .run(batch_start(), &records, &sink)
        .await
        .unwrap();

    assert_eq!(
        key,
        "test-bucket/raw/orders/year=2023/month=01/day=05/20230105-14.parquet"
    );

    let payload = sink.get(&key).unwrap();
    let reader = ParquetRecordBatchReaderBuilder::try_new(payload)
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<_> = reader.collect::<Result<_, _>>().unwrap();

    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.num_rows(), 2);

    let ids = batch
        .column_by_name("id")
        .unwrap()
        .as_any()
        .downcast_ref::<arrow::array::Int64Array>()
        .unwrap();
    assert_eq!(ids.value(0), 1);
    assert_eq!(ids.value(1), 2);

    // Record 1 never had meta.zone; the column materializes it as null.
    let metas = batch
        .column_by_name("meta")
        .unwrap()
        .as_any()
        .downcast_ref::<arrow::array::StructArray>()
        .unwrap()
        .clone();
    let zones = metas.column_by_name("zone").unwrap();
    assert!(zones.is_null(0));

    let zones = zones
        .as_any()
        .downcast_ref::<arrow::array::StringArray>()
        .unwrap();
    assert_eq!(zones.value(1), "a");
}

#[tokio::test]
async fn test_jsonl_batch_to_local_filesystem() {
    let dir = tempfile::tempdir().unwrap();

    let mut config = partitioned_config(FormatType::Jsonl);
    config.append_date_to_filename_grain = DateGrain::Second;

    let sink = ObjectStoreSink::local(dir.path().to_str().unwrap()).unwrap();
    let records = vec![json!({"id": 1}), json!({"id": 2})];

    let key = BatchPreparer::new(&config, "events")
        .run(batch_start(), &records, &sink)
        .await
        .unwrap();
    assert!(key.ends_with("20230105-143000.jsonl"));

    let written = std::fs::read_to_string(dir.path().join(&key)).unwrap();
    assert_eq!(written, "{\"id\":1}\n{\"id\":2}");
}

#[tokio::test]
async fn test_flattened_parquet_batch() {
    let mut config = SinkConfig::new(FormatType::Parquet, "b");
    config.flatten_records = true;
    let sink = MemorySink::new();

    let records = vec![json!({"user": {"name": "ada", "tags": ["x"]}})];
    let key = BatchPreparer::new(&config, "s")
        .run(batch_start(), &records, &sink)
        .await
        .unwrap();

    let payload = sink.get(&key).unwrap();
    let reader = ParquetRecordBatchReaderBuilder::try_new(payload)
        .unwrap()
        .build()
        .unwrap();
    let batch = reader
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
        .pop()
        .unwrap();

    // Nested keys collapse to flat columns; list values land as JSON text.
    assert!(batch.column_by_name("user__name").is_some());
    let tags = batch
        .column_by_name("user__tags")
        .unwrap()
        .as_any()
        .downcast_ref::<arrow::array::StringArray>()
        .unwrap()
        .clone();
    assert_eq!(tags.value(0), "[\"x\"]");
}

#[tokio::test]
async fn test_declared_schema_parquet_batch() {
    let mut config = SinkConfig::new(FormatType::Parquet, "b");
    config.get_schema_from_tap = true;
    let sink = MemorySink::new();

    let declared = match json!({
        "id": {"type": "integer"},
        "created_at": {"type": "string", "format": "date-time"}
    }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };

    let records = vec![json!({"id": "7", "created_at": "2023-01-05T14:30:00"})];
    let key = BatchPreparer::new(&config, "s")
        .with_declared_schema(declared)
        .run(batch_start(), &records, &sink)
        .await
        .unwrap();

    let payload = sink.get(&key).unwrap();
    let reader = ParquetRecordBatchReaderBuilder::try_new(payload)
        .unwrap()
        .build()
        .unwrap();
    let batch = reader
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
        .pop()
        .unwrap();

    // The declared schema coerced "7" and typed created_at as a timestamp.
    let ids = batch
        .column_by_name("id")
        .unwrap()
        .as_any()
        .downcast_ref::<arrow::array::Int64Array>()
        .unwrap()
        .clone();
    assert_eq!(ids.value(0), 7);

    let ts = batch
        .column_by_name("created_at")
        .unwrap()
        .as_any()
        .downcast_ref::<arrow::array::TimestampMicrosecondArray>()
        .unwrap()
        .clone();
    assert_eq!(ts.value(0), 1_672_929_000_000_000);
}

#[tokio::test]
async fn test_coercion_error_leaves_no_partial_artifact() {
    let config = SinkConfig::new(FormatType::Parquet, "b");
    let sink = MemorySink::new();

    let records = vec![json!({"id": 1}), json!({"id": "abc"})];
    let result = BatchPreparer::new(&config, "s")
        .run(batch_start(), &records, &sink)
        .await;

    assert!(result.is_err());
    assert!(sink.keys().is_empty());
}

#[tokio::test]
async fn test_store_failure_propagates() {
    struct FailingSink;

    #[async_trait::async_trait]
    impl ObjectSink for FailingSink {
        async fn store(&self, _key: &str, _payload: Bytes) -> lakesink::Result<()> {
            Err(lakesink::Error::Other("sink unavailable".to_string()))
        }
    }

    let config = SinkConfig::new(FormatType::Jsonl, "b");
    let result = BatchPreparer::new(&config, "s")
        .run(batch_start(), &[json!({"id": 1})], &FailingSink)
        .await;

    assert!(result.is_err());
}
