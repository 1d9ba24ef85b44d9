//! Training entry point.

use levante_signals::{feature_matrix, wide_to_long};
use levante_traits::{FeatureScaler, LevanteError, Regressor, Result};
use ndarray::Array1;
use polars::prelude::DataFrame;
use tracing::info;

use crate::regressor::{RidgeConfig, RidgeRegressor};
use crate::scaler::StandardScaler;

/// Fit the baseline model pair on a wide feature table.
///
/// Reshapes wide → long, keeps rows with a realized next-day return,
/// standardizes the features, and fits the ridge regressor against the
/// realized returns.
///
/// # Errors
///
/// Returns [`LevanteError::NoFeatureColumns`] for a table without
/// sentiment features, or an error when no labeled rows remain.
pub fn train_model(wide: &DataFrame) -> Result<(RidgeRegressor, StandardScaler)> {
    let rows = wide_to_long(wide)?;
    let labeled: Vec<_> = rows
        .into_iter()
        .filter(|r| r.next_day_return.is_some())
        .collect();
    if labeled.is_empty() {
        return Err(LevanteError::InsufficientData(
            "no labeled rows to train on".to_string(),
        ));
    }

    let features = feature_matrix(&labeled);
    let target: Array1<f64> = labeled
        .iter()
        .filter_map(|r| r.next_day_return)
        .collect();

    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&features)?;

    let mut model = RidgeRegressor::new(RidgeConfig::default());
    model.fit(&scaled, &target)?;

    info!(observations = labeled.len(), "model trained");
    Ok((model, scaler))
}
