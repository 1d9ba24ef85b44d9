//! Error types for dataset assembly.

use thiserror::Error;

/// Errors that can occur while building the merged dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Sentiment collection failed structurally.
    #[error("Sentiment collection error: {0}")]
    Gdelt(#[from] levante_gdelt::GdeltError),

    /// Price fetching failed structurally.
    #[error("Price fetch error: {0}")]
    Price(#[from] levante_prices::PriceError),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Filesystem error on the dataset cache.
    #[error("Dataset cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sentiment table is malformed (missing expected columns).
    #[error("Malformed sentiment table: {0}")]
    MalformedSentiment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DatasetError::MalformedSentiment("no currency column".to_string());
        assert!(err.to_string().contains("no currency column"));
    }
}
