//! Parquet encoding
//!
//! Encodes a prepared batch to Parquet bytes in memory; the sink decides
//! where they land. Compression is part of the Parquet file itself, so the
//! key carries no separate compression suffix.

use super::to_record_batch;
use super::Format;
use crate::batch::PreparedBatch;
use crate::config::SinkConfig;
use crate::error::Result;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

/// Configuration for the Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024, // 1M rows
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use GZIP compression
    #[must_use]
    pub fn gzip(mut self) -> Self {
        self.compression = Compression::GZIP(parquet::basic::GzipLevel::default());
        self
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Parquet output format
pub struct ParquetFormat {
    config: ParquetWriterConfig,
}

impl ParquetFormat {
    /// Create with an explicit writer configuration
    pub fn new(config: ParquetWriterConfig) -> Self {
        Self { config }
    }

    /// Derive the writer configuration from the sink configuration
    pub fn from_config(config: &SinkConfig) -> Self {
        let mut writer_config = ParquetWriterConfig::new();
        if config.compression.is_some() {
            writer_config = writer_config.gzip();
        }
        Self::new(writer_config)
    }
}

impl Default for ParquetFormat {
    fn default() -> Self {
        Self::new(ParquetWriterConfig::default())
    }
}

impl Format for ParquetFormat {
    fn extension(&self) -> &'static str {
        "parquet"
    }

    fn encode(&self, batch: &PreparedBatch) -> Result<Bytes> {
        let record_batch = to_record_batch(&batch.schema, &batch.columns, batch.row_count)?;

        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(
            &mut buffer,
            record_batch.schema(),
            Some(self.config.build_properties()),
        )?;
        writer.write(&record_batch)?;
        writer.close()?;

        Ok(Bytes::from(buffer))
    }
}
