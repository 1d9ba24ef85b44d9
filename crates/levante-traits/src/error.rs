//! Error types for the levante pipeline.
//!
//! This module defines the error type shared across the levante crates,
//! covering data validation, dataset assembly, and model application.

use thiserror::Error;

/// The main error type for levante operations.
///
/// Per-unit failures (a single day of events, a single instrument) are
/// absorbed at their unit boundary and never surface through this type;
/// what does surface here are structural problems a caller must deal with.
#[derive(Debug, Error)]
pub enum LevanteError {
    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when a required column is missing from a table.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error when a table carries none of the expected sentiment feature
    /// columns, which indicates a caller-configuration problem rather than
    /// a data-availability gap.
    #[error("No sentiment feature columns found (expected avg_tone_<ccy> columns)")]
    NoFeatureColumns,

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Error when data is insufficient for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error when a ticker is not part of the configured universe.
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    /// Error when a date is out of range or fails to parse.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error fetching data from external sources.
    #[error("Data fetch error: {0}")]
    DataFetch(String),

    /// Error applying a model or scaler.
    #[error("Model error: {0}")]
    Model(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for LevanteError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for LevanteError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for levante operations.
pub type Result<T> = std::result::Result<T, LevanteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LevanteError::MissingColumn("avg_tone_eur".to_string());
        assert_eq!(err.to_string(), "Missing required column: avg_tone_eur");

        let err = LevanteError::InvalidDate("2024-13-01".to_string());
        assert_eq!(err.to_string(), "Invalid date: 2024-13-01");
    }

    #[test]
    fn test_error_from_str() {
        let err: LevanteError = "something odd".into();
        assert!(matches!(err, LevanteError::Other(_)));
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert!(ok_result.is_ok());
    }
}
