//! Bulk collection across a date range.
//!
//! Fans one aggregation task out per calendar day under a bounded
//! semaphore, collects results in completion order, and restores
//! determinism with a final (event_date, currency) sort. Day failures are
//! already absorbed below; the report keeps them distinguishable from
//! days the source simply had nothing for.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use levante_traits::Date;
use levante_traits::types::date_range;
use polars::prelude::*;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::aggregate::{DayAggregator, DayOutcome, DayResult, empty_aggregate};
use crate::Result;

/// Default number of in-flight day fetches.
///
/// The archive host publishes no formal rate limit; this cap keeps the
/// collector a polite client while the runs stay I/O-bound.
pub const DEFAULT_CONCURRENCY: usize = 12;

/// Log progress after this many completed days.
const PROGRESS_EVERY: usize = 30;

/// Tally of how a collection run went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectReport {
    /// Calendar days in the requested range.
    pub days_total: usize,
    /// Days contributing at least one aggregate row.
    pub days_with_data: usize,
    /// Days that completed with no rows (absent feed, all filtered, or
    /// unknown schema).
    pub days_empty: usize,
    /// Days whose failure was absorbed.
    pub days_failed: usize,
    /// Total aggregate rows collected.
    pub rows: usize,
}

/// Runs the day aggregator across a date range with bounded concurrency.
#[derive(Debug)]
pub struct BulkCollector {
    aggregator: Arc<DayAggregator>,
    concurrency: usize,
}

impl BulkCollector {
    /// Create a collector with the default concurrency cap.
    #[must_use]
    pub fn new(aggregator: Arc<DayAggregator>) -> Self {
        Self {
            aggregator,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Override the concurrency cap (clamped to at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Collect aggregates for every calendar date in `[start, end]`.
    ///
    /// The returned table is sorted by (event_date, currency). An
    /// all-empty range yields an empty table with the aggregate schema;
    /// the report tells empty apart from failed.
    ///
    /// # Errors
    ///
    /// Returns an error only for structural problems concatenating or
    /// sorting results; per-day failures are absorbed and counted.
    pub async fn collect_range(&self, start: Date, end: Date) -> Result<(DataFrame, CollectReport)> {
        let dates = date_range(start, end);
        let total = dates.len();
        info!(%start, %end, days = total, "collecting event sentiment");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let completed = Arc::new(AtomicUsize::new(0));

        let tasks = dates.into_iter().map(|date| {
            let aggregator = Arc::clone(&self.aggregator);
            let semaphore = Arc::clone(&semaphore);
            let completed = Arc::clone(&completed);
            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = aggregator.aggregate_day(date).await;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if done % PROGRESS_EVERY == 0 || done == total {
                    info!(done, total, "collection progress");
                }
                result
            })
        });

        let mut report = CollectReport {
            days_total: total,
            ..Default::default()
        };
        let mut table = empty_aggregate();

        for joined in join_all(tasks).await {
            let result: DayResult = match joined {
                Ok(result) => result,
                Err(e) => {
                    // A panicked task counts as a failed day.
                    warn!(error = %e, "day task join failed");
                    report.days_failed += 1;
                    continue;
                }
            };

            match &result.outcome {
                DayOutcome::Failed { .. } => report.days_failed += 1,
                _ if result.is_empty() => report.days_empty += 1,
                _ => {
                    report.days_with_data += 1;
                    report.rows += result.rows.height();
                    table.vstack_mut(&result.rows)?;
                }
            }
        }

        let table = table.sort(["event_date", "currency"], Default::default())?;
        info!(
            rows = report.rows,
            with_data = report.days_with_data,
            empty = report.days_empty,
            failed = report.days_failed,
            "collection complete"
        );
        Ok((table, report))
    }
}
