//! Signal-matrix backtest.
//!
//! Positions form at the close of each signal date and earn the move to
//! the next price date. Longs split +1 equally, shorts split −1 equally;
//! a currency flagged both ways nets the two legs. Days without a signal
//! row hold the previous weights and pay no costs.

use std::collections::HashMap;

use levante_signals::EntryMatrices;
use levante_traits::types::column_dates;
use levante_traits::{Date, LevanteError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Transaction fee in basis points of traded notional.
    pub fee_bps: f64,
    /// Slippage in basis points of traded notional.
    pub slippage_bps: f64,
    /// Trading days per year used for annualization.
    pub trading_days_per_year: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            fee_bps: 5.0,
            slippage_bps: 1.0,
            trading_days_per_year: 252,
        }
    }
}

/// Backtest results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Daily portfolio returns, net of costs.
    pub returns: Vec<f64>,
    /// Compounded cumulative returns.
    pub cumulative_returns: Vec<f64>,
    /// Total compounded return.
    pub total_return: f64,
    /// Annualized return.
    pub annualized_return: f64,
    /// Annualized volatility.
    pub annualized_volatility: f64,
    /// Annualized Sharpe ratio.
    pub sharpe_ratio: f64,
    /// Maximum drawdown (positive fraction).
    pub max_drawdown: f64,
    /// Fraction of traded days with a positive net return.
    pub win_rate: f64,
    /// Number of simulated days.
    pub n_days: usize,
}

impl BacktestResult {
    /// Annualized Sharpe ratio of a daily return series.
    #[must_use]
    pub fn calculate_sharpe(returns: &[f64], trading_days_per_year: usize) -> f64 {
        let valid: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
        if valid.len() < 2 {
            return f64::NAN;
        }
        let mean = valid.iter().sum::<f64>() / valid.len() as f64;
        let variance =
            valid.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (valid.len() - 1) as f64;
        let std = variance.sqrt();
        if std == 0.0 {
            f64::NAN
        } else {
            mean / std * (trading_days_per_year as f64).sqrt()
        }
    }

    /// Maximum drawdown of a compounded cumulative-return series.
    #[must_use]
    pub fn calculate_max_drawdown(cumulative_returns: &[f64]) -> f64 {
        let mut max_dd = 0.0;
        let mut peak = 0.0;
        for &cum in cumulative_returns {
            if cum > peak {
                peak = cum;
            }
            let dd = (peak - cum) / (1.0 + peak);
            if dd > max_dd {
                max_dd = dd;
            }
        }
        max_dd
    }
}

/// Backtesting engine over entry matrices.
#[derive(Debug, Default)]
pub struct SignalBacktest {
    config: BacktestConfig,
}

impl SignalBacktest {
    /// Create a backtest with the given configuration.
    #[must_use]
    pub const fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Run the backtest.
    ///
    /// `prices` is the wide daily price table (date + uppercase ticker
    /// columns); `entries` are the long/short matrices from the signal
    /// builder. Tickers missing from either side simply do not trade.
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs lack date columns or fewer than two
    /// price dates overlap the simulation.
    pub fn run(&self, prices: &DataFrame, entries: &EntryMatrices) -> Result<BacktestResult> {
        let price_dates = column_dates(prices, "date")?;
        if price_dates.len() < 2 {
            return Err(LevanteError::InsufficientData(
                "need at least two price dates to backtest".to_string(),
            ));
        }

        let tickers: Vec<String> = prices
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| name != "date")
            .collect();

        let mut levels: HashMap<&str, Vec<Option<f64>>> = HashMap::new();
        for ticker in &tickers {
            let values = prices
                .column(ticker)?
                .as_materialized_series()
                .f64()?
                .into_iter()
                .collect();
            levels.insert(ticker.as_str(), values);
        }

        let signal_rows = signal_rows_by_date(entries)?;
        let long_flags = flag_table(&entries.long, &tickers)?;
        let short_flags = flag_table(&entries.short, &tickers)?;

        let cost_rate = (self.config.fee_bps + self.config.slippage_bps) / 10_000.0;

        let mut weights: Vec<f64> = vec![0.0; tickers.len()];
        let mut returns = Vec::with_capacity(price_dates.len() - 1);
        let mut cumulative = Vec::with_capacity(price_dates.len() - 1);
        let mut cum = 0.0;

        for t in 0..price_dates.len() - 1 {
            let mut cost = 0.0;
            if let Some(&row) = signal_rows.get(&price_dates[t]) {
                let new_weights = target_weights(row, &long_flags, &short_flags);
                let turnover: f64 = weights
                    .iter()
                    .zip(new_weights.iter())
                    .map(|(old, new)| (new - old).abs())
                    .sum();
                cost = turnover * cost_rate;
                weights = new_weights;
            }

            let mut gross = 0.0;
            for (i, ticker) in tickers.iter().enumerate() {
                if weights[i] == 0.0 {
                    continue;
                }
                let series = &levels[ticker.as_str()];
                if let (Some(cur), Some(next)) = (series[t], series[t + 1]) {
                    if cur != 0.0 {
                        gross += weights[i] * (next / cur - 1.0);
                    }
                }
            }

            let net = gross - cost;
            returns.push(net);
            cum = (1.0 + cum) * (1.0 + net) - 1.0;
            cumulative.push(cum);
        }

        let n_days = returns.len();
        let traded: Vec<f64> = returns.iter().copied().filter(|r| *r != 0.0).collect();
        let win_rate = if traded.is_empty() {
            0.0
        } else {
            traded.iter().filter(|r| **r > 0.0).count() as f64 / traded.len() as f64
        };

        let total_return = cum;
        let n_years = n_days as f64 / self.config.trading_days_per_year as f64;
        let annualized_return = if n_years > 0.0 {
            (1.0 + total_return).powf(1.0 / n_years) - 1.0
        } else {
            f64::NAN
        };
        let annualized_volatility = if n_days > 1 {
            let mean = returns.iter().sum::<f64>() / n_days as f64;
            let variance =
                returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n_days - 1) as f64;
            variance.sqrt() * (self.config.trading_days_per_year as f64).sqrt()
        } else {
            f64::NAN
        };

        debug!(n_days, total_return, "backtest complete");
        Ok(BacktestResult {
            sharpe_ratio: BacktestResult::calculate_sharpe(
                &returns,
                self.config.trading_days_per_year,
            ),
            max_drawdown: BacktestResult::calculate_max_drawdown(&cumulative),
            returns,
            cumulative_returns: cumulative,
            total_return,
            annualized_return,
            annualized_volatility,
            win_rate,
            n_days,
        })
    }
}

/// Map from signal date to row index in the entry matrices.
fn signal_rows_by_date(entries: &EntryMatrices) -> Result<HashMap<Date, usize>> {
    let dates = column_dates(&entries.long, "date")?;
    Ok(dates.into_iter().enumerate().map(|(i, d)| (d, i)).collect())
}

/// Boolean flags per (row, ticker index); tickers absent from the matrix
/// are all-false.
fn flag_table(matrix: &DataFrame, tickers: &[String]) -> Result<Vec<Vec<bool>>> {
    let height = matrix.height();
    let mut table = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let flags = match matrix.column(ticker) {
            Ok(column) => column
                .as_materialized_series()
                .bool()?
                .into_iter()
                .map(|v| v.unwrap_or(false))
                .collect(),
            Err(_) => vec![false; height],
        };
        table.push(flags);
    }
    Ok(table)
}

/// Equal-weight legs: +1 split across longs, −1 across shorts, netted.
fn target_weights(row: usize, long_flags: &[Vec<bool>], short_flags: &[Vec<bool>]) -> Vec<f64> {
    let n_long = long_flags.iter().filter(|f| f[row]).count();
    let n_short = short_flags.iter().filter(|f| f[row]).count();

    let mut weights = vec![0.0; long_flags.len()];
    for (i, weight) in weights.iter_mut().enumerate() {
        if n_long > 0 && long_flags[i][row] {
            *weight += 1.0 / n_long as f64;
        }
        if n_short > 0 && short_flags[i][row] {
            *weight -= 1.0 / n_short as f64;
        }
    }
    weights
}
