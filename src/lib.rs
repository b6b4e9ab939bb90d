//! # lakesink
//!
//! A batch record-to-columnar sink: converts batches of loosely-typed nested
//! JSON records into typed columnar (Parquet) artifacts stored under
//! deterministic, time-partitioned object keys.
//!
//! The hard part is not moving bytes to a bucket; the storage sink is a
//! one-method trait. It is deriving a single columnar schema from records
//! whose shape varies record-to-record, reconciling every value against it,
//! and producing a stable object key per batch.
//!
//! ## Pipeline
//!
//! ```text
//! raw record batch
//!   → [flatten]?              nested keys joined with `__`, sorted order
//!   → [infer | derive]        one SchemaTable per batch
//!   → [validate]              coerce/null/grow, column-major output
//!   → [format encode]         parquet / json / jsonl bytes
//!   → sink.store(key, bytes)  key from the batch start time + grain config
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lakesink::{BatchPreparer, FormatType, MemorySink, SinkConfig};
//!
//! #[tokio::main]
//! async fn main() -> lakesink::Result<()> {
//!     let mut config = SinkConfig::new(FormatType::Parquet, "my-bucket");
//!     config.append_date_to_prefix = true;
//!     config.partition_name_enabled = true;
//!
//!     let sink = MemorySink::new();
//!     let records = vec![serde_json::json!({"id": 1})];
//!
//!     let key = BatchPreparer::new(&config, "orders")
//!         .run(chrono::Utc::now().naive_utc(), &records, &sink)
//!         .await?;
//!     println!("wrote {key}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Add docs before 1.0 release

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Sink configuration
pub mod config;

/// Object key derivation from batch start time and grain
pub mod key;

/// Record flattening
pub mod flatten;

/// Schema inference, derivation and validation
pub mod schema;

/// Output format implementations and registry
pub mod format;

/// Batch preparation and orchestration
pub mod batch;

/// Object storage sinks
pub mod sink;

// ============================================================================
// Re-exports
// ============================================================================

pub use batch::{BatchPreparer, PreparedBatch};
pub use config::{DateGrain, FormatType, SinkConfig};
pub use error::{Error, Result};
pub use flatten::flatten_record;
pub use key::build_key;
pub use schema::{FieldSchema, ScalarKind, SchemaTable};
pub use sink::{MemorySink, ObjectSink, ObjectStoreSink};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
