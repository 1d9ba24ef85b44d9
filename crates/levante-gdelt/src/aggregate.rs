//! Per-day event aggregation.
//!
//! `aggregate_day` is the unit of work and the unit of fault isolation:
//! whatever happens while fetching or parsing one day, the caller gets a
//! `DayResult` back — possibly empty, never a panic or a propagated error.
//! The outcome of each day is recorded as a structured value so callers
//! and tests can see *why* a day produced no rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use levante_traits::types::dates_to_column;
use levante_traits::{Date, universe};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::DayStore;
use crate::client::{DayFeed, EventSource};
use crate::schema::RawEvent;
use crate::Result;

/// Record filters applied before grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFilters {
    /// Minimum NumMentions for a record to count.
    pub min_mentions: u32,
    /// Minimum records in a (date, currency) group for the group to survive.
    pub min_event_count: u32,
    /// Keep only root (originating) events.
    pub root_only: bool,
    /// Keep only records with |tone| at or above this magnitude.
    pub tone_threshold: Option<f64>,
}

impl Default for EventFilters {
    fn default() -> Self {
        Self {
            min_mentions: 1,
            min_event_count: 1,
            root_only: false,
            tone_threshold: None,
        }
    }
}

/// Why a day produced the rows it did.
#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    /// Rows came from the day cache; no fetch was attempted. Cached rows
    /// reflect the filter parameters in force when they were written.
    Cached,
    /// Rows were fetched and aggregated in this run.
    Fetched {
        /// Valid records parsed from the feed.
        raw: usize,
        /// Aggregate rows surviving all filters.
        kept: usize,
    },
    /// The source published nothing for this date.
    NoData,
    /// The feed's column count matched no known schema revision.
    SchemaMismatch {
        /// Observed column count.
        columns: usize,
    },
    /// Fetch or aggregation failed; the error was absorbed here.
    Failed {
        /// Display form of the absorbed error.
        reason: String,
    },
}

/// The aggregate for one calendar day plus how it came to be.
#[derive(Debug, Clone)]
pub struct DayResult {
    /// The day this result covers.
    pub date: Date,
    /// Aggregate rows: event_date, currency, avg_tone, tone_dispersion,
    /// event_count. Possibly empty.
    pub rows: DataFrame,
    /// Structured outcome for logging and assertions.
    pub outcome: DayOutcome,
}

impl DayResult {
    /// Whether the day yielded no aggregate rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// An aggregate frame with the right schema and zero rows.
#[must_use]
pub fn empty_aggregate() -> DataFrame {
    DataFrame::new(vec![
        dates_to_column("event_date", &[]),
        Series::new("currency".into(), Vec::<String>::new()).into_column(),
        Series::new("avg_tone".into(), Vec::<f64>::new()).into_column(),
        Float64Chunked::from_slice_options("tone_dispersion".into(), &[])
            .into_series()
            .into_column(),
        UInt32Chunked::from_vec("event_count".into(), Vec::new())
            .into_series()
            .into_column(),
    ])
    .expect("static empty schema")
}

/// Fetches, filters, aggregates and caches one day of events.
pub struct DayAggregator {
    source: Arc<dyn EventSource>,
    store: Arc<dyn DayStore>,
    filters: EventFilters,
}

impl std::fmt::Debug for DayAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DayAggregator")
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl DayAggregator {
    /// Create an aggregator over an event source and a day store.
    #[must_use]
    pub fn new(source: Arc<dyn EventSource>, store: Arc<dyn DayStore>, filters: EventFilters) -> Self {
        Self {
            source,
            store,
            filters,
        }
    }

    /// The filters this aggregator applies.
    #[must_use]
    pub const fn filters(&self) -> &EventFilters {
        &self.filters
    }

    /// Aggregate one calendar day.
    ///
    /// Cache hits are returned unconditionally without touching the
    /// network. Every error is absorbed into [`DayOutcome::Failed`]; this
    /// method never fails.
    pub async fn aggregate_day(&self, date: Date) -> DayResult {
        match self.try_aggregate(date).await {
            Ok(result) => result,
            Err(e) => {
                warn!(%date, error = %e, "day aggregation failed");
                DayResult {
                    date,
                    rows: empty_aggregate(),
                    outcome: DayOutcome::Failed {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    async fn try_aggregate(&self, date: Date) -> Result<DayResult> {
        if let Some(rows) = self.store.get(date)? {
            debug!(%date, rows = rows.height(), "day cache hit");
            return Ok(DayResult {
                date,
                rows,
                outcome: DayOutcome::Cached,
            });
        }

        let feed = self.source.fetch_day(date).await?;
        let (rows, outcome) = match feed {
            DayFeed::Absent => (empty_aggregate(), DayOutcome::NoData),
            DayFeed::UnknownSchema { columns } => {
                warn!(%date, columns, "unrecognized export layout");
                (empty_aggregate(), DayOutcome::SchemaMismatch { columns })
            }
            DayFeed::Events(events) => {
                let raw = events.len();
                let rows = aggregate_events(date, &events, &self.filters)?;
                let kept = rows.height();
                (rows, DayOutcome::Fetched { raw, kept })
            }
        };

        // Write-once per date; a crash before this point leaves no file,
        // so a retry recomputes from scratch.
        if !rows.is_empty() {
            self.store.put(date, &rows)?;
        }

        Ok(DayResult {
            date,
            rows,
            outcome,
        })
    }
}

/// Filter and group one day's records into per-currency statistics.
fn aggregate_events(date: Date, events: &[RawEvent], filters: &EventFilters) -> Result<DataFrame> {
    let mut groups: BTreeMap<&'static str, Vec<f64>> = BTreeMap::new();

    for event in events {
        // Universe restriction doubles as the country→currency mapping.
        let Some(ticker) = universe::ticker_for_country(&event.country) else {
            continue;
        };
        // The feed carries delayed coverage of older events; only same-day
        // reporting counts as fresh news.
        if event.event_date != date {
            continue;
        }
        if event.num_mentions < filters.min_mentions {
            continue;
        }
        if filters.root_only && !event.is_root {
            continue;
        }
        if let Some(threshold) = filters.tone_threshold {
            if event.avg_tone.abs() < threshold {
                continue;
            }
        }
        groups.entry(ticker).or_default().push(event.avg_tone);
    }

    let mut currencies: Vec<&str> = Vec::new();
    let mut means: Vec<f64> = Vec::new();
    let mut dispersions: Vec<Option<f64>> = Vec::new();
    let mut counts: Vec<u32> = Vec::new();

    for (ticker, tones) in &groups {
        let n = tones.len();
        if (n as u32) < filters.min_event_count {
            continue;
        }
        let mean = tones.iter().sum::<f64>() / n as f64;
        let dispersion = if n >= 2 {
            let variance = tones.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            Some(variance.sqrt())
        } else {
            None
        };
        currencies.push(ticker);
        means.push(mean);
        dispersions.push(dispersion);
        counts.push(n as u32);
    }

    let dates = vec![date; currencies.len()];
    Ok(DataFrame::new(vec![
        dates_to_column("event_date", &dates),
        Series::new("currency".into(), currencies).into_column(),
        Series::new("avg_tone".into(), means).into_column(),
        Float64Chunked::from_slice_options("tone_dispersion".into(), &dispersions)
            .into_series()
            .into_column(),
        UInt32Chunked::from_vec("event_count".into(), counts)
            .into_series()
            .into_column(),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryDayStore;
    use crate::{GdeltError, Result};
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(event_date: Date, country: &str, mentions: u32, root: bool, tone: f64) -> RawEvent {
        RawEvent {
            event_id: 1,
            event_date,
            country: country.to_string(),
            is_root: root,
            num_mentions: mentions,
            avg_tone: tone,
        }
    }

    /// Serves a fixed feed per date and counts fetches.
    struct PlannedSource {
        feed: DayFeed,
        calls: AtomicUsize,
    }

    impl PlannedSource {
        fn events(events: Vec<RawEvent>) -> Self {
            Self {
                feed: DayFeed::Events(events),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventSource for PlannedSource {
        async fn fetch_day(&self, _date: Date) -> Result<DayFeed> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.feed.clone())
        }
    }

    /// Errors on any contact; cache hits must never reach it.
    struct UnreachableSource;

    #[async_trait]
    impl EventSource for UnreachableSource {
        async fn fetch_day(&self, _date: Date) -> Result<DayFeed> {
            Err(GdeltError::Task("network access not expected".to_string()))
        }
    }

    #[test]
    fn test_same_day_filter_excludes_stale_reports() {
        let target = date(2021, 3, 15);
        let events = vec![
            event(target, "TUR", 5, true, -2.0),
            // Delayed coverage of older events appears in the same feed.
            event(date(2021, 3, 10), "TUR", 50, true, -9.0),
            event(date(2021, 3, 14), "BRA", 5, true, 3.0),
        ];
        let rows = aggregate_events(target, &events, &EventFilters::default()).unwrap();
        assert_eq!(rows.height(), 1);
        let tone = rows.column("avg_tone").unwrap().as_materialized_series().f64().unwrap().get(0).unwrap();
        assert_relative_eq!(tone, -2.0);
    }

    #[test]
    fn test_universe_restriction() {
        let target = date(2021, 3, 15);
        let events = vec![
            event(target, "TUR", 5, true, -2.0),
            event(target, "USA", 5, true, 4.0), // not in the universe
        ];
        let rows = aggregate_events(target, &events, &EventFilters::default()).unwrap();
        assert_eq!(rows.height(), 1);
        let ccy = rows.column("currency").unwrap().as_materialized_series().str().unwrap().get(0).unwrap();
        assert_eq!(ccy, "TRY");
    }

    #[test]
    fn test_mention_root_and_tone_filters() {
        let target = date(2021, 3, 15);
        let events = vec![
            event(target, "TUR", 1, false, -0.5),
            event(target, "TUR", 10, true, -5.0),
            event(target, "TUR", 10, false, 9.0),
        ];
        let filters = EventFilters {
            min_mentions: 5,
            min_event_count: 1,
            root_only: true,
            tone_threshold: Some(1.0),
        };
        let rows = aggregate_events(target, &events, &filters).unwrap();
        assert_eq!(rows.height(), 1);
        let count = rows.column("event_count").unwrap().as_materialized_series().u32().unwrap().get(0).unwrap();
        assert_eq!(count, 1);
        let tone = rows.column("avg_tone").unwrap().as_materialized_series().f64().unwrap().get(0).unwrap();
        assert_relative_eq!(tone, -5.0);
    }

    #[test]
    fn test_group_statistics_match_hand_computed() {
        let target = date(2021, 3, 15);
        let events = vec![
            event(target, "BRA", 3, true, 1.0),
            event(target, "BRA", 3, true, 2.0),
            event(target, "BRA", 3, true, 6.0),
        ];
        let rows = aggregate_events(target, &events, &EventFilters::default()).unwrap();
        assert_eq!(rows.height(), 1);

        let mean = rows.column("avg_tone").unwrap().as_materialized_series().f64().unwrap().get(0).unwrap();
        assert_relative_eq!(mean, 3.0);

        // Sample standard deviation of {1, 2, 6}: sqrt(((−2)² + (−1)² + 3²) / 2)
        let disp = rows
            .column("tone_dispersion")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(0)
            .unwrap();
        assert_relative_eq!(disp, (14.0f64 / 2.0).sqrt(), epsilon = 1e-12);

        let count = rows.column("event_count").unwrap().as_materialized_series().u32().unwrap().get(0).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_single_observation_has_null_dispersion() {
        let target = date(2021, 3, 15);
        let events = vec![event(target, "BRA", 3, true, 1.5)];
        let rows = aggregate_events(target, &events, &EventFilters::default()).unwrap();
        assert_eq!(rows.height(), 1);
        assert!(rows
            .column("tone_dispersion")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(0)
            .is_none());
    }

    #[test]
    fn test_min_event_count_drops_small_groups() {
        let target = date(2021, 3, 15);
        let events = vec![
            event(target, "BRA", 3, true, 1.0),
            event(target, "BRA", 3, true, 2.0),
            event(target, "TUR", 3, true, -1.0),
        ];
        let filters = EventFilters {
            min_event_count: 2,
            ..Default::default()
        };
        let rows = aggregate_events(target, &events, &filters).unwrap();
        assert_eq!(rows.height(), 1);
        let ccy = rows.column("currency").unwrap().as_materialized_series().str().unwrap().get(0).unwrap();
        assert_eq!(ccy, "BRL");
    }

    #[tokio::test]
    async fn test_aggregate_day_is_idempotent_and_cached() {
        let target = date(2021, 3, 15);
        let source = Arc::new(PlannedSource::events(vec![
            event(target, "TUR", 5, true, -2.0),
            event(target, "TUR", 5, true, -4.0),
        ]));
        let store = Arc::new(MemoryDayStore::new());
        let aggregator =
            DayAggregator::new(source.clone(), store.clone(), EventFilters::default());

        let first = aggregator.aggregate_day(target).await;
        assert_eq!(first.outcome, DayOutcome::Fetched { raw: 2, kept: 1 });
        assert_eq!(store.len(), 1);

        let second = aggregator.aggregate_day(target).await;
        assert_eq!(second.outcome, DayOutcome::Cached);
        assert!(second.rows.equals_missing(&first.rows));
        // Exactly one fetch across both calls.
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_never_touches_the_network() {
        let target = date(2021, 3, 15);
        let store = Arc::new(MemoryDayStore::new());

        // Warm the cache through a working source first.
        let warm = DayAggregator::new(
            Arc::new(PlannedSource::events(vec![event(target, "BRA", 5, true, 1.0)])),
            store.clone(),
            EventFilters::default(),
        );
        let warmed = warm.aggregate_day(target).await;
        assert!(!warmed.is_empty());

        // Now a source that errors on any contact.
        let cold = DayAggregator::new(Arc::new(UnreachableSource), store, EventFilters::default());
        let result = cold.aggregate_day(target).await;
        assert_eq!(result.outcome, DayOutcome::Cached);
        assert!(result.rows.equals_missing(&warmed.rows));
    }

    #[tokio::test]
    async fn test_absent_day_is_no_data_not_an_error() {
        let source = Arc::new(PlannedSource {
            feed: DayFeed::Absent,
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MemoryDayStore::new());
        let aggregator = DayAggregator::new(source, store.clone(), EventFilters::default());

        let result = aggregator.aggregate_day(date(2021, 3, 15)).await;
        assert_eq!(result.outcome, DayOutcome::NoData);
        assert!(result.is_empty());
        // Empty days are not cached.
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_schema_is_empty_not_fatal() {
        let source = Arc::new(PlannedSource {
            feed: DayFeed::UnknownSchema { columns: 45 },
            calls: AtomicUsize::new(0),
        });
        let aggregator = DayAggregator::new(
            source,
            Arc::new(MemoryDayStore::new()),
            EventFilters::default(),
        );
        let result = aggregator.aggregate_day(date(2021, 3, 15)).await;
        assert_eq!(result.outcome, DayOutcome::SchemaMismatch { columns: 45 });
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_is_absorbed_with_reason() {
        let aggregator = DayAggregator::new(
            Arc::new(UnreachableSource),
            Arc::new(MemoryDayStore::new()),
            EventFilters::default(),
        );
        let result = aggregator.aggregate_day(date(2021, 3, 15)).await;
        assert!(result.is_empty());
        match result.outcome {
            DayOutcome::Failed { reason } => assert!(reason.contains("not expected")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
