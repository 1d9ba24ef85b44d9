//! Cross-sectional ranking and entry matrices.
//!
//! Per date, currencies are ranked by predicted return descending with
//! first-seen tie-breaking, so the output is deterministic for a fixed
//! input order. The top of the book goes long, the bottom goes short;
//! when `2·top_n` exceeds the day's cross-section the partitions overlap
//! by construction.

use std::collections::BTreeMap;

use levante_traits::types::dates_to_column;
use levante_traits::{Date, Result, universe};
use polars::prelude::*;
use tracing::debug;

/// One model prediction for one (date, currency).
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Prediction date.
    pub date: Date,
    /// Currency ticker (any case; canonicalized on output).
    pub currency: String,
    /// Predicted next-day return.
    pub predicted_return: f64,
}

/// Boolean long/short entry matrices, date rows × uppercase ticker columns.
#[derive(Debug, Clone)]
pub struct EntryMatrices {
    /// Long entries: true where the currency ranks in the top `top_n`.
    pub long: DataFrame,
    /// Short entries: true where the currency ranks in the bottom `top_n`
    /// of that day's cross-section.
    pub short: DataFrame,
}

/// Build long/short entry matrices from per-currency predictions.
///
/// Columns cover every universe currency present in the predictions, in
/// canonical universe order, uppercase. A currency absent on a given date
/// is `false`, not missing. Currencies outside the configured universe
/// are ignored.
///
/// # Errors
///
/// Returns an error only if the output frames cannot be assembled.
pub fn build_entries(predictions: &[Prediction], top_n: usize) -> Result<EntryMatrices> {
    // Group per date, keeping input order within each date for stable ties.
    let mut by_date: BTreeMap<Date, Vec<(String, f64)>> = BTreeMap::new();
    for p in predictions {
        let ticker = p.currency.to_ascii_uppercase();
        if universe::country_for_ticker(&ticker).is_none() {
            debug!(ticker, "ignoring prediction outside the universe");
            continue;
        }
        by_date
            .entry(p.date)
            .or_default()
            .push((ticker, p.predicted_return));
    }

    let tickers: Vec<String> = universe::tickers()
        .iter()
        .filter(|t| {
            by_date
                .values()
                .any(|day| day.iter().any(|(ticker, _)| ticker == *t))
        })
        .map(|t| (*t).to_string())
        .collect();

    let dates: Vec<Date> = by_date.keys().copied().collect();
    let mut long_cells: BTreeMap<(usize, usize), bool> = BTreeMap::new();
    let mut short_cells: BTreeMap<(usize, usize), bool> = BTreeMap::new();

    for (row, date) in dates.iter().enumerate() {
        let day = &by_date[date];
        let n = day.len();

        // Stable descending sort: equal scores keep first-seen order.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            day[b]
                .1
                .partial_cmp(&day[a].1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for (rank0, &idx) in order.iter().enumerate() {
            let rank = rank0 + 1;
            let (ticker, _) = &day[idx];
            let Some(col) = tickers.iter().position(|t| t == ticker) else {
                continue;
            };
            if rank <= top_n {
                long_cells.insert((row, col), true);
            }
            if rank + top_n > n {
                short_cells.insert((row, col), true);
            }
        }
    }

    let long = entry_frame(&dates, &tickers, &long_cells)?;
    let short = entry_frame(&dates, &tickers, &short_cells)?;
    Ok(EntryMatrices { long, short })
}

fn entry_frame(
    dates: &[Date],
    tickers: &[String],
    cells: &BTreeMap<(usize, usize), bool>,
) -> Result<DataFrame> {
    let mut columns = vec![dates_to_column("date", dates)];
    for (col, ticker) in tickers.iter().enumerate() {
        let flags: Vec<bool> = (0..dates.len())
            .map(|row| cells.get(&(row, col)).copied().unwrap_or(false))
            .collect();
        columns.push(
            BooleanChunked::from_slice(ticker.as_str().into(), &flags)
                .into_series()
                .into_column(),
        );
    }
    Ok(DataFrame::new(columns)?)
}
