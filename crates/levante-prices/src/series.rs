//! Canonical price table assembly and gap repair.
//!
//! Per-symbol observations become one wide frame: a `date` column plus one
//! f64 column per instrument, uppercase ticker names with no symbol-suffix
//! decoration. Gaps are forward-filled then back-filled; instruments whose
//! originally-missing share exceeds [`MAX_MISSING_FRACTION`] are dropped
//! and reported, never silently.

use std::collections::{BTreeSet, HashMap};

use futures::future::join_all;
use levante_traits::types::dates_to_column;
use levante_traits::{Date, universe};
use polars::prelude::*;
use tracing::warn;

use crate::client::QuoteClient;
use crate::Result;

/// An instrument missing more than this fraction of its observations over
/// the query window is dropped from the output.
pub const MAX_MISSING_FRACTION: f64 = 0.5;

/// Fetches and normalizes daily FX price series.
#[derive(Debug, Clone)]
pub struct PriceFetcher {
    client: QuoteClient,
    tickers: Vec<String>,
}

impl PriceFetcher {
    /// Create a fetcher over the full configured currency universe.
    #[must_use]
    pub fn new(client: QuoteClient) -> Self {
        Self {
            client,
            tickers: universe::tickers().iter().map(|t| (*t).to_string()).collect(),
        }
    }

    /// Restrict the fetcher to an explicit ticker list.
    #[must_use]
    pub fn with_tickers(mut self, tickers: Vec<String>) -> Self {
        self.tickers = tickers;
        self
    }

    /// Fetch the wide daily price table for `[start, end]`.
    ///
    /// Instruments whose fetch fails are treated as fully missing and
    /// dropped with a warning — one bad symbol never aborts the batch.
    ///
    /// # Errors
    ///
    /// Returns an error only if the final table cannot be assembled.
    pub async fn fetch_prices(&self, start: Date, end: Date) -> Result<DataFrame> {
        let fetches = self.tickers.iter().map(|ticker| {
            let symbol = universe::quote_symbol(ticker);
            let client = self.client.clone();
            async move { (ticker.clone(), client.fetch_history(&symbol, start, end).await) }
        });

        let mut series = Vec::with_capacity(self.tickers.len());
        for (ticker, result) in join_all(fetches).await {
            match result {
                Ok(observations) => series.push((ticker.to_ascii_uppercase(), observations)),
                Err(e) => {
                    warn!(%ticker, error = %e, "dropping instrument: fetch failed");
                }
            }
        }

        build_price_table(&series)
    }

    /// Fetch prices and derive per-instrument simple returns
    /// (`p[t]/p[t-1] − 1`, first row null), date-only index.
    ///
    /// # Errors
    ///
    /// Returns an error if the price table cannot be assembled.
    pub async fn fetch_returns(&self, start: Date, end: Date) -> Result<DataFrame> {
        let prices = self.fetch_prices(start, end).await?;
        simple_returns(&prices)
    }
}

/// Normalize per-instrument observations into the canonical wide table.
///
/// The date axis is the sorted union of every instrument's observation
/// dates. Missingness is measured against that axis *before* repair, so
/// fill-in cannot mask a sparse instrument.
///
/// # Errors
///
/// Returns an error if column assembly fails.
pub fn build_price_table(series: &[(String, Vec<(Date, Option<f64>)>)]) -> Result<DataFrame> {
    let axis: Vec<Date> = series
        .iter()
        .flat_map(|(_, obs)| obs.iter().map(|(d, _)| *d))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut columns = vec![dates_to_column("date", &axis)];

    for (ticker, observations) in series {
        let by_date: HashMap<Date, Option<f64>> = observations.iter().copied().collect();
        let mut values: Vec<Option<f64>> = axis
            .iter()
            .map(|d| by_date.get(d).copied().flatten())
            .collect();

        let missing = values.iter().filter(|v| v.is_none()).count();
        let fraction = if axis.is_empty() {
            1.0
        } else {
            missing as f64 / axis.len() as f64
        };
        if fraction > MAX_MISSING_FRACTION {
            warn!(
                %ticker,
                missing_pct = (fraction * 100.0).round(),
                "dropping instrument: excessive missing data"
            );
            continue;
        }

        fill_forward_then_back(&mut values);
        columns.push(
            Float64Chunked::from_slice_options(ticker.as_str().into(), &values)
                .into_series()
                .into_column(),
        );
    }

    Ok(DataFrame::new(columns)?)
}

/// Derive simple returns from a wide price table.
///
/// Output columns are `<ccy>_ret`, lowercase, one per price column; the
/// first row of each is null.
///
/// # Errors
///
/// Returns an error if the date column is missing or a price column is
/// not numeric.
pub fn simple_returns(prices: &DataFrame) -> Result<DataFrame> {
    let date = prices.column("date")?.clone();
    let mut columns = vec![date];

    for column in prices.get_columns() {
        let name = column.name().as_str();
        if name == "date" {
            continue;
        }
        let values: Vec<Option<f64>> = column.as_materialized_series().f64()?.into_iter().collect();

        let returns: Vec<Option<f64>> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if i == 0 {
                    return None;
                }
                match (values[i - 1], v) {
                    (Some(prev), Some(cur)) if prev != 0.0 => Some(cur / prev - 1.0),
                    _ => None,
                }
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

/// Forward-fill then back-fill in place.
fn fill_forward_then_back(values: &mut [Option<f64>]) {
    let mut last = None;
    for v in values.iter_mut() {
        match v {
            Some(x) => last = Some(*x),
            None => *v = last,
        }
    }
    let mut next = None;
    for v in values.iter_mut().rev() {
        match v {
            Some(x) => next = Some(*x),
            None => *v = next,
        }
    }
}
