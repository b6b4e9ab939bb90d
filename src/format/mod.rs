//! Output formats
//!
//! A small closed interface over the supported output formats, plus the
//! registry mapping configured format names to implementations. Parquet is
//! the columnar path this crate exists for; JSON and JSONL are trivial
//! text renditions kept for contrast.

mod arrow;
mod parquet;
mod text;

pub use arrow::{arrow_data_type, arrow_schema, to_record_batch};
pub use parquet::{ParquetFormat, ParquetWriterConfig};
pub use text::{JsonFormat, JsonlFormat};

use crate::batch::PreparedBatch;
use crate::config::{FormatType, SinkConfig};
use crate::error::{Error, Result};
use bytes::Bytes;
use serde_json::{Map, Value};

/// One output format: record prep plus byte encoding
pub trait Format: Send + Sync {
    /// File extension appended to the object key
    fn extension(&self) -> &'static str;

    /// Format-specific record preparation, applied before schema
    /// construction. Most formats need none.
    fn prepare(&self, _records: &mut Vec<Map<String, Value>>) -> Result<()> {
        Ok(())
    }

    /// Encode a prepared batch to its final byte payload
    fn encode(&self, batch: &PreparedBatch) -> Result<Bytes>;
}

/// Instantiate the format selected by the configuration
pub fn format_for(config: &SinkConfig) -> Box<dyn Format> {
    match config.format {
        FormatType::Parquet => Box::new(ParquetFormat::from_config(config)),
        FormatType::Json => Box::new(JsonFormat),
        FormatType::Jsonl => Box::new(JsonlFormat),
    }
}

/// Resolve a format name from free text (configuration files, CLI layers)
pub fn format_by_name(name: &str) -> Result<FormatType> {
    match name {
        "parquet" => Ok(FormatType::Parquet),
        "json" => Ok(FormatType::Json),
        "jsonl" => Ok(FormatType::Jsonl),
        other => Err(Error::UnknownFormat {
            format: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests;
