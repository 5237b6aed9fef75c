//! Error types for the coviddash normalization pipeline.
//!
//! This module defines one error type per failure class:
//!
//! - [`SourceError`] - a remote or local table could not be retrieved
//! - [`SchemaError`] - a retrieved table lacks a required column
//! - [`DataFormatError`] - a column exists but a value cannot be coerced
//! - [`PipelineError`] - top-level error returned by the normalizer and reshaper
//! - [`ConfigError`] - invalid `COVIDDASH_*` settings
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while retrieving a raw table.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network failure, timeout or unexpected HTTP status.
    #[error("Source unavailable for {resource}: {reason}")]
    Unavailable { resource: String, reason: String },

    /// The resource does not exist (e.g. no report published for that date).
    #[error("No data published for {resource}")]
    NotFound { resource: String },

    /// The response was retrieved but is not a readable table.
    #[error("Malformed table for {resource}: {reason}")]
    Malformed { resource: String, reason: String },

    /// Local file access failed.
    #[error("Failed to read local table: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// A required column is absent from a retrieved table.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// None of the accepted names for a column are present.
    #[error("Missing column '{column}' in {table}")]
    MissingColumn { column: String, table: String },

    /// A wide time-series table carries no date columns.
    #[error("No date columns found in {table}")]
    NoDateColumns { table: String },
}

// =============================================================================
// Data Format Errors
// =============================================================================

/// A value cannot be coerced to the type its column requires.
///
/// `row` is the 1-based data row (header excluded).
#[derive(Debug, Error)]
pub enum DataFormatError {
    /// Case count is not a non-negative integer.
    #[error("Row {row}, column '{column}': '{value}' is not a case count")]
    InvalidCount { column: String, row: usize, value: String },

    /// County identifier is not numeric.
    #[error("Row {row}, column '{column}': '{value}' is not a county identifier")]
    InvalidIdentifier { column: String, row: usize, value: String },

    /// Latitude or longitude is not a number.
    #[error("Row {row}, column '{column}': '{value}' is not a coordinate")]
    InvalidCoordinate { column: String, row: usize, value: String },

    /// A date cell cannot be parsed.
    #[error("Row {row}, column '{column}': '{value}' is not a date")]
    InvalidDate { column: String, row: usize, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Coarse classification of a [`PipelineError`], used by callers that only need
/// to decide between "no data", "bad schema" and "bad values".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SourceUnavailable,
    Schema,
    DataFormat,
    InvalidInput,
}

/// Top-level error returned by the daily-report normalizer and the time-series reshaper.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Retrieval error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Missing column.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Uncoercible value.
    #[error("Data format error: {0}")]
    DataFormat(#[from] DataFormatError),

    /// The caller passed a date string in an unsupported form.
    #[error("Invalid report date '{0}': expected MM-DD-YYYY, MM-DD-YY or YYYY-MM-DD")]
    InvalidReportDate(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Source(_) => ErrorKind::SourceUnavailable,
            PipelineError::Schema(_) => ErrorKind::Schema,
            PipelineError::DataFormat(_) => ErrorKind::DataFormat,
            PipelineError::InvalidReportDate(_) => ErrorKind::InvalidInput,
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue { key: String, value: String, reason: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // SourceError -> PipelineError
        let source_err = SourceError::NotFound { resource: "daily report 01-01-2019".into() };
        let pipeline_err: PipelineError = source_err.into();
        assert_eq!(pipeline_err.kind(), ErrorKind::SourceUnavailable);
        assert!(pipeline_err.to_string().contains("01-01-2019"));

        // SchemaError -> PipelineError
        let schema_err = SchemaError::MissingColumn {
            column: "FIPS".into(),
            table: "daily report".into(),
        };
        let pipeline_err: PipelineError = schema_err.into();
        assert_eq!(pipeline_err.kind(), ErrorKind::Schema);
        assert!(pipeline_err.to_string().contains("FIPS"));
    }

    #[test]
    fn test_data_format_error_message() {
        let err = DataFormatError::InvalidCount {
            column: "Confirmed".into(),
            row: 4,
            value: "n/a".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 4"));
        assert!(msg.contains("'Confirmed'"));
        assert!(msg.contains("'n/a'"));

        let pipeline_err: PipelineError = err.into();
        assert_eq!(pipeline_err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn test_server_error_wraps_pipeline() {
        let err: ServerError = PipelineError::InvalidReportDate("yesterday".into()).into();
        assert!(err.to_string().contains("yesterday"));
    }
}
