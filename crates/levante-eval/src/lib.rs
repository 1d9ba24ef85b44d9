//! Backtesting for levante entry signals.
//!
//! Simulates a daily-rebalanced, equal-weight long/short portfolio driven
//! by boolean entry matrices against a wide price table, charging fees
//! and slippage on turnover, and reports the usual performance statistics.
//!
//! # Example
//!
//! ```rust,ignore
//! use levante_eval::{BacktestConfig, SignalBacktest};
//!
//! let backtest = SignalBacktest::new(BacktestConfig::default());
//! let result = backtest.run(&prices, &entries)?;
//! println!("Sharpe: {:.2}", result.sharpe_ratio);
//! ```

mod backtest;

pub use backtest::{BacktestConfig, BacktestResult, SignalBacktest};
