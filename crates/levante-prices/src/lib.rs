//! FX price fetching and normalization for levante.
//!
//! Fetches daily closing levels for the configured currency pairs from the
//! quote source's chart endpoint, normalizes the per-symbol responses into
//! one canonical wide table (date rows, uppercase ticker columns), repairs
//! weekend/holiday gaps, drops instruments with excessive missing data, and
//! derives simple returns.
//!
//! # Usage
//!
//! ```rust,ignore
//! use levante_prices::{PriceFetcher, QuoteClient};
//!
//! let fetcher = PriceFetcher::new(QuoteClient::new());
//! let prices = fetcher.fetch_prices(start, end).await?;
//! let returns = fetcher.fetch_returns(start, end).await?;
//! ```

mod client;
mod error;
mod series;

pub use client::{QuoteClient, YAHOO_CHART_BASE_URL};
pub use error::PriceError;
pub use series::{MAX_MISSING_FRACTION, PriceFetcher, build_price_table, simple_returns};

/// Result type for price operations.
pub type Result<T> = std::result::Result<T, PriceError>;
