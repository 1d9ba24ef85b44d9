//! Dataset builder.
//!
//! Orchestrates sentiment collection and price fetching, pivots the long
//! sentiment aggregate to wide form, aligns it with forward returns, and
//! memoizes the merged result to a Parquet file. A readable cache file is
//! returned unconditionally — same trust-on-presence policy as the per-day
//! cache, with the same documented staleness caveat.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use chrono::Days;
use levante_gdelt::BulkCollector;
use levante_prices::PriceFetcher;
use levante_traits::Date;
use levante_traits::types::{column_dates, dates_to_column};
use polars::prelude::*;
use tracing::{info, warn};

use crate::Result;
use crate::error::DatasetError;

/// Extra trailing days fetched past the requested window so the forward
/// return at the window's end is computable.
pub const PRICE_BUFFER_DAYS: u64 = 3;

/// Wide-table metrics, in output column order.
const METRICS: [&str; 3] = ["avg_tone", "event_count", "tone_dispersion"];

/// Builds and caches the merged sentiment/return dataset.
#[derive(Debug)]
pub struct DatasetBuilder {
    collector: Arc<BulkCollector>,
    fetcher: PriceFetcher,
}

impl DatasetBuilder {
    /// Create a builder over a sentiment collector and a price fetcher.
    #[must_use]
    pub fn new(collector: Arc<BulkCollector>, fetcher: PriceFetcher) -> Self {
        Self { collector, fetcher }
    }

    /// Build the merged dataset for `[start, end]`, memoized to `cache_path`.
    ///
    /// A readable file at `cache_path` short-circuits the entire build.
    ///
    /// # Errors
    ///
    /// Returns an error on structural failures (collection, fetch, join,
    /// persistence); per-day and per-instrument gaps are absorbed upstream.
    pub async fn build(&self, start: Date, end: Date, cache_path: &Path) -> Result<DataFrame> {
        if cache_path.exists() {
            match ParquetReader::new(File::open(cache_path)?).finish() {
                Ok(df) => {
                    info!(path = %cache_path.display(), rows = df.height(), "loading cached dataset");
                    return Ok(df);
                }
                Err(e) => {
                    warn!(path = %cache_path.display(), error = %e, "unreadable dataset cache, rebuilding");
                }
            }
        }

        info!(%start, %end, "building dataset");
        let (sentiment, report) = self.collector.collect_range(start, end).await?;
        info!(rows = report.rows, failed_days = report.days_failed, "sentiment collected");

        let price_end = end.checked_add_days(Days::new(PRICE_BUFFER_DAYS)).unwrap_or(end);
        let prices = self.fetcher.fetch_prices(start, price_end).await?;

        let mut dataset = assemble(&sentiment, &prices)?;

        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(cache_path)?;
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Zstd(None))
            .finish(&mut dataset)?;

        let bytes = fs::metadata(cache_path).map(|m| m.len()).unwrap_or(0);
        info!(
            path = %cache_path.display(),
            rows = dataset.height(),
            bytes,
            "dataset built and cached"
        );
        Ok(dataset)
    }
}

/// Merge a long sentiment aggregate with a wide price table.
///
/// Inner join on date, then every row still carrying a null is dropped —
/// the strict completeness requirement for downstream modeling.
///
/// # Errors
///
/// Returns an error if either input is malformed or the join fails.
pub fn assemble(sentiment: &DataFrame, prices: &DataFrame) -> Result<DataFrame> {
    let wide = pivot_sentiment(sentiment)?;
    let returns = forward_returns(prices)?;

    let merged = wide
        .lazy()
        .join(
            returns.lazy(),
            [col("event_date")],
            [col("date")],
            JoinArgs::new(JoinType::Inner),
        )
        .drop_nulls(None)
        .collect()?;
    Ok(merged)
}

/// Pivot the long (event_date, currency) aggregate into wide form.
///
/// One row per event_date; one `<metric>_<ccy>` column (lowercase) per
/// metric and currency observed anywhere in the input. Combinations absent
/// on a given date become nulls, which the post-join drop removes.
///
/// # Errors
///
/// Returns an error if the expected long-format columns are absent.
pub fn pivot_sentiment(long: &DataFrame) -> Result<DataFrame> {
    let dates = column_dates(long, "event_date")
        .map_err(|e| DatasetError::MalformedSentiment(e.to_string()))?;
    let currencies = long
        .column("currency")
        .map_err(|_| DatasetError::MalformedSentiment("missing currency column".to_string()))?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|c| c.map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| DatasetError::MalformedSentiment("null currency".to_string()))?;
    let tones: Vec<Option<f64>> = long
        .column("avg_tone")
        .map_err(|_| DatasetError::MalformedSentiment("missing avg_tone column".to_string()))?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .collect();
    let dispersions: Vec<Option<f64>> = long
        .column("tone_dispersion")
        .map_err(|_| DatasetError::MalformedSentiment("missing tone_dispersion column".to_string()))?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .collect();
    let counts: Vec<Option<u32>> = long
        .column("event_count")
        .map_err(|_| DatasetError::MalformedSentiment("missing event_count column".to_string()))?
        .as_materialized_series()
        .u32()?
        .into_iter()
        .collect();

    // (date → currency → metrics), currencies lowercased for column names.
    let mut cells: BTreeMap<Date, HashMap<String, (Option<f64>, Option<f64>, Option<f64>)>> =
        BTreeMap::new();
    let mut observed: BTreeSet<String> = BTreeSet::new();

    for i in 0..dates.len() {
        let ccy = currencies[i].to_ascii_lowercase();
        observed.insert(ccy.clone());
        cells.entry(dates[i]).or_default().insert(
            ccy,
            (tones[i], counts[i].map(f64::from), dispersions[i]),
        );
    }

    let axis: Vec<Date> = cells.keys().copied().collect();
    let mut columns = vec![dates_to_column("event_date", &axis)];

    for metric in METRICS {
        for ccy in &observed {
            let values: Vec<Option<f64>> = axis
                .iter()
                .map(|d| {
                    cells
                        .get(d)
                        .and_then(|row| row.get(ccy))
                        .and_then(|(tone, count, dispersion)| match metric {
                            "avg_tone" => *tone,
                            "event_count" => *count,
                            _ => *dispersion,
                        })
                })
                .collect();
            columns.push(
                Float64Chunked::from_slice_options(format!("{metric}_{ccy}").into(), &values)
                    .into_series()
                    .into_column(),
            );
        }
    }

    Ok(DataFrame::new(columns)?)
}

/// Derive forward returns from a wide price table.
///
/// The return assigned to date `t` is `price[t+1]/price[t] − 1` — realized
/// strictly after `t`'s sentiment is known. The last row is null. Output
/// columns are `<ccy>_ret`, lowercase.
///
/// # Errors
///
/// Returns an error if the date column is missing or a price column is
/// not numeric.
pub fn forward_returns(prices: &DataFrame) -> Result<DataFrame> {
    let date = prices.column("date")?.clone();
    let mut columns = vec![date];

    for column in prices.get_columns() {
        let name = column.name().as_str();
        if name == "date" {
            continue;
        }
        let values: Vec<Option<f64>> = column.as_materialized_series().f64()?.into_iter().collect();

        let returns: Vec<Option<f64>> = (0..values.len())
            .map(|i| match (values[i], values.get(i + 1).copied().flatten()) {
                (Some(cur), Some(next)) if cur != 0.0 => Some(next / cur - 1.0),
                _ => None,
            })
            .collect();

        columns.push(
            Float64Chunked::from_slice_options(
                format!("{}_ret", name.to_ascii_lowercase()).into(),
                &returns,
            )
            .into_series()
            .into_column(),
        );
    }

    Ok(DataFrame::new(columns)?)
}
