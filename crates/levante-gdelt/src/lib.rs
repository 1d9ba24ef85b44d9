//! GDELT events ingestion and daily sentiment aggregation for levante.
//!
//! This crate turns the raw GDELT 1.0 daily event exports into a per-day,
//! per-currency sentiment table. One calendar day is the unit of work and
//! the unit of fault isolation: each day is fetched, filtered, aggregated
//! and cached independently, and a failing day degrades to an empty result
//! instead of aborting a larger collection.
//!
//! # Usage
//!
//! ```rust,ignore
//! use levante_gdelt::{BulkCollector, DayAggregator, EventFilters, EventsClient, ParquetDayStore};
//! use std::sync::Arc;
//!
//! let aggregator = DayAggregator::new(
//!     Arc::new(EventsClient::new()),
//!     Arc::new(ParquetDayStore::new("data/raw/gdelt_daily")?),
//!     EventFilters::default(),
//! );
//! let collector = BulkCollector::new(Arc::new(aggregator));
//! let (sentiment, report) = collector.collect_range(start, end).await?;
//! ```

mod aggregate;
mod cache;
mod client;
mod collect;
mod error;
mod schema;

pub use aggregate::{DayAggregator, DayOutcome, DayResult, EventFilters, empty_aggregate};
pub use cache::{DayStore, MemoryDayStore, ParquetDayStore};
pub use client::{DayFeed, EventSource, EventsClient, GDELT_EVENTS_BASE_URL};
pub use collect::{BulkCollector, CollectReport, DEFAULT_CONCURRENCY};
pub use error::GdeltError;
pub use schema::{ColumnLayout, EventSchema, RawEvent};

/// Result type for GDELT ingestion operations.
pub type Result<T> = std::result::Result<T, GdeltError>;
