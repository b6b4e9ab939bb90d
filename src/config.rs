//! Sink configuration
//!
//! All knobs that shape one batch write: output format, object key layout
//! (date partitioning grain, Hive-style partition names), record preparation
//! (flattening, process date) and the schema strategy.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Time grain for date-based partitioning, coarsest to finest
///
/// Each grain has a fixed rank (year=7 .. microsecond=1); a configured grain
/// includes every level from year down to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateGrain {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Microsecond,
}

impl DateGrain {
    /// Numeric rank of this grain (year=7 .. microsecond=1)
    pub fn rank(self) -> u8 {
        match self {
            DateGrain::Year => 7,
            DateGrain::Month => 6,
            DateGrain::Day => 5,
            DateGrain::Hour => 4,
            DateGrain::Minute => 3,
            DateGrain::Second => 2,
            DateGrain::Microsecond => 1,
        }
    }

    /// Whether a path/filename at this configured grain includes `level`
    pub fn includes(self, level: DateGrain) -> bool {
        self.rank() <= level.rank()
    }

    /// Partition segment name for Hive-style `name=value` prefixes
    pub fn level_name(self) -> &'static str {
        match self {
            DateGrain::Year => "year",
            DateGrain::Month => "month",
            DateGrain::Day => "day",
            DateGrain::Hour => "hour",
            DateGrain::Minute => "minute",
            DateGrain::Second => "second",
            DateGrain::Microsecond => "microsecond",
        }
    }

    /// All grains ordered coarsest-first
    pub const ALL: [DateGrain; 7] = [
        DateGrain::Year,
        DateGrain::Month,
        DateGrain::Day,
        DateGrain::Hour,
        DateGrain::Minute,
        DateGrain::Second,
        DateGrain::Microsecond,
    ];
}

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    Parquet,
    Json,
    Jsonl,
}

impl FormatType {
    /// Format name as used in configuration and the format registry
    pub fn as_str(self) -> &'static str {
        match self {
            FormatType::Parquet => "parquet",
            FormatType::Json => "json",
            FormatType::Jsonl => "jsonl",
        }
    }
}

/// Complete sink configuration for one stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Output format
    pub format: FormatType,

    /// Target bucket (or top-level directory for local stores)
    pub bucket: String,

    /// Key prefix inside the bucket
    #[serde(default)]
    pub prefix: String,

    /// Append date-derived folder segments to the key prefix
    #[serde(default)]
    pub append_date_to_prefix: bool,

    /// Grain of the date folder segments
    #[serde(default = "default_grain")]
    pub append_date_to_prefix_grain: DateGrain,

    /// Prefix each date segment with its level name (`year=2023/month=01/`)
    #[serde(default)]
    pub partition_name_enabled: bool,

    /// Append a date fragment to the file name
    #[serde(default)]
    pub append_date_to_filename: bool,

    /// Grain of the file name date fragment
    #[serde(default = "default_grain")]
    pub append_date_to_filename_grain: DateGrain,

    /// Replaces the stream name in the folder path only
    #[serde(default)]
    pub stream_name_path_override: Option<String>,

    /// Flatten nested records into single-level records before writing
    #[serde(default)]
    pub flatten_records: bool,

    /// Append a `_PROCESS_DATE` field (UTC, ISO-8601) to every record
    #[serde(default)]
    pub include_process_date: bool,

    /// Validate/coerce every value against the batch schema
    #[serde(default = "default_true")]
    pub validate: bool,

    /// Use the declared (tap-supplied) schema instead of inferring one
    #[serde(default)]
    pub get_schema_from_tap: bool,

    /// Compression codec; only "gzip" is supported
    #[serde(default)]
    pub compression: Option<String>,

    /// Maximum records per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_grain() -> DateGrain {
    DateGrain::Day
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    10_000
}

impl SinkConfig {
    /// Create a config with required fields and defaults everywhere else
    pub fn new(format: FormatType, bucket: impl Into<String>) -> Self {
        Self {
            format,
            bucket: bucket.into(),
            prefix: String::new(),
            append_date_to_prefix: false,
            append_date_to_prefix_grain: default_grain(),
            partition_name_enabled: false,
            append_date_to_filename: false,
            append_date_to_filename_grain: default_grain(),
            stream_name_path_override: None,
            flatten_records: false,
            include_process_date: false,
            validate: true,
            get_schema_from_tap: false,
            compression: None,
            batch_size: default_batch_size(),
        }
    }

    /// Validate the configuration, failing fast before any record is processed
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(Error::missing_field("bucket"));
        }

        if let Some(codec) = &self.compression {
            if codec != "gzip" {
                return Err(Error::invalid_value(
                    "compression",
                    format!("unsupported codec '{codec}', only 'gzip' is supported"),
                ));
            }
        }

        if self.batch_size == 0 {
            return Err(Error::invalid_value("batch_size", "must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grain_ranks() {
        assert_eq!(DateGrain::Year.rank(), 7);
        assert_eq!(DateGrain::Microsecond.rank(), 1);
        assert!(DateGrain::Day.includes(DateGrain::Year));
        assert!(DateGrain::Day.includes(DateGrain::Day));
        assert!(!DateGrain::Day.includes(DateGrain::Hour));
    }

    #[test]
    fn test_grain_deserialize_lowercase() {
        let grain: DateGrain = serde_json::from_str("\"minute\"").unwrap();
        assert_eq!(grain, DateGrain::Minute);
    }

    #[test]
    fn test_config_defaults() {
        let cfg: SinkConfig = serde_json::from_value(serde_json::json!({
            "format": "parquet",
            "bucket": "my-bucket"
        }))
        .unwrap();

        assert_eq!(cfg.format, FormatType::Parquet);
        assert!(!cfg.append_date_to_prefix);
        assert_eq!(cfg.append_date_to_prefix_grain, DateGrain::Day);
        assert!(cfg.validate);
        assert_eq!(cfg.batch_size, 10_000);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_missing_format_is_rejected() {
        let result: std::result::Result<SinkConfig, _> =
            serde_json::from_value(serde_json::json!({ "bucket": "b" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_compression() {
        let mut cfg = SinkConfig::new(FormatType::Parquet, "b");
        cfg.compression = Some("lz4".to_string());
        assert!(cfg.validate().is_err());

        cfg.compression = Some("gzip".to_string());
        cfg.validate().unwrap();
    }

    #[test]
    fn test_empty_bucket_fails_fast() {
        let cfg = SinkConfig::new(FormatType::Parquet, "");
        assert!(matches!(
            cfg.validate(),
            Err(crate::error::Error::MissingConfigField { .. })
        ));
    }
}
