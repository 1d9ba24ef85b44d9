//! Error types for GDELT ingestion.

use thiserror::Error;

/// Errors that can occur while fetching or aggregating event data.
///
/// These errors never cross a day boundary: [`crate::DayAggregator`]
/// absorbs them into a [`crate::DayOutcome`] so a single bad day cannot
/// abort a bulk collection.
#[derive(Debug, Error)]
pub enum GdeltError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The archive returned a non-success status other than 404.
    #[error("Archive returned HTTP {0}")]
    Status(u16),

    /// The zip container could not be decoded.
    #[error("Archive decode error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The delimited event table could not be read.
    #[error("Event table error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem error on the local cache.
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// A background day-task was cancelled or panicked.
    #[error("Day task failed: {0}")]
    Task(String),
}
