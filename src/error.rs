//! Error types for lakesink
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for lakesink
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Schema / Validation Errors
    // ============================================================================
    #[error("Cannot coerce value for field '{field}': expected {expected}, got {value}")]
    Coercion {
        field: String,
        expected: String,
        value: String,
    },

    #[error("Schema derivation failed: {message}")]
    SchemaDerivation { message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("Unknown output format: {format}")]
    UnknownFormat { format: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a coercion error
    pub fn coercion(
        field: impl Into<String>,
        expected: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self::Coercion {
            field: field.into(),
            expected: expected.into(),
            value: value.to_string(),
        }
    }

    /// Create a schema derivation error
    pub fn derivation(message: impl Into<String>) -> Self {
        Self::SchemaDerivation {
            message: message.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Check if this error is fatal for the whole batch
    ///
    /// Coercion and encoding failures abort the batch write; configuration
    /// errors abort before any record is processed. Storage errors are left
    /// to the orchestrator's retry policy.
    pub fn is_batch_fatal(&self) -> bool {
        !matches!(self, Error::ObjectStore(_) | Error::Io(_))
    }
}

/// Result type alias for lakesink
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("bucket");
        assert_eq!(err.to_string(), "Missing required config field: bucket");

        let err = Error::coercion("id", "integer", "\"abc\"");
        assert_eq!(
            err.to_string(),
            "Cannot coerce value for field 'id': expected integer, got \"abc\""
        );
    }

    #[test]
    fn test_is_batch_fatal() {
        assert!(Error::coercion("x", "integer", "a").is_batch_fatal());
        assert!(Error::encoding("empty struct").is_batch_fatal());
        assert!(Error::config("bad grain").is_batch_fatal());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
