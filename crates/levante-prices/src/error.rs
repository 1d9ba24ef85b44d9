//! Error types for the price layer.

use thiserror::Error;

/// Errors that can occur when fetching or shaping price data.
#[derive(Debug, Error)]
pub enum PriceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The quote source answered with an error payload.
    #[error("Quote source error: {0}")]
    Api(String),

    /// The quote source returned nothing usable for a symbol.
    #[error("No data available for {0}")]
    NoData(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}
