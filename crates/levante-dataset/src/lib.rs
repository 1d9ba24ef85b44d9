//! Merged sentiment/return dataset assembly for levante.
//!
//! Joins the long-format sentiment aggregate against forward FX returns on
//! date, producing the wide modeling table. The join is strictly inner and
//! rows with any missing value are dropped, so downstream training and
//! backtesting never see a partially-missing cross-section. The forward
//! shift happens here and only here: the return assigned to day `t` is the
//! one realized *after* day `t`'s sentiment is observable.

mod builder;
mod error;

pub use builder::{DatasetBuilder, PRICE_BUFFER_DAYS, assemble, forward_returns, pivot_sentiment};
pub use error::DatasetError;

/// Result type for dataset assembly.
pub type Result<T> = std::result::Result<T, DatasetError>;
