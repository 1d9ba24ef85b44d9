//! Baseline model pair for the levante pipeline.
//!
//! The pipeline's model interface is deliberately small — fit, predict,
//! scale — and any regression algorithm can stand behind it. This crate
//! provides the substitutable baseline: a per-column standardizing scaler
//! and a closed-form ridge regressor over the three sentiment features.

mod regressor;
mod scaler;
mod train;

pub use regressor::{RidgeConfig, RidgeRegressor};
pub use scaler::StandardScaler;
pub use train::train_model;
