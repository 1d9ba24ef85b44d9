//! Feature-to-signal pipeline.
//!
//! Bridges a wide feature table and a fitted model+scaler pair into entry
//! matrices. Only rows with a known realized return are scored — the same
//! restriction the training side applies — so predictions and labels stay
//! on a common support.

use levante_traits::{FeatureScaler, LevanteError, Regressor, Result};
use polars::prelude::DataFrame;

use crate::entries::{EntryMatrices, Prediction, build_entries};
use crate::features::{feature_matrix, wide_to_long};

/// Score a wide feature table with a fitted model and build entry matrices.
///
/// # Errors
///
/// Returns [`LevanteError::NoFeatureColumns`] for a table without
/// sentiment features, an error if no row carries a realized return, or
/// whatever the scaler/model surface.
pub fn signals_from_features(
    wide: &DataFrame,
    scaler: &dyn FeatureScaler,
    model: &dyn Regressor,
    top_n: usize,
) -> Result<EntryMatrices> {
    let rows = wide_to_long(wide)?;
    let labeled: Vec<_> = rows
        .into_iter()
        .filter(|r| r.next_day_return.is_some())
        .collect();
    if labeled.is_empty() {
        return Err(LevanteError::InsufficientData(
            "no rows with a realized next-day return".to_string(),
        ));
    }

    let features = scaler.transform(&feature_matrix(&labeled))?;
    let scores = model.predict(&features)?;

    let predictions: Vec<Prediction> = labeled
        .iter()
        .zip(scores.iter())
        .map(|(row, score)| Prediction {
            date: row.date,
            currency: row.currency.clone(),
            predicted_return: *score,
        })
        .collect();

    build_entries(&predictions, top_n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use levante_traits::Date;
    use levante_traits::types::dates_to_column;
    use ndarray::{Array1, Array2};
    use polars::prelude::*;

    /// Pass-through scaler.
    struct IdentityScaler;

    impl FeatureScaler for IdentityScaler {
        fn fit_transform(&mut self, features: &Array2<f64>) -> Result<Array2<f64>> {
            Ok(features.clone())
        }

        fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
            Ok(features.clone())
        }
    }

    /// Predicts the first feature (avg_tone) verbatim.
    struct ToneEcho;

    impl Regressor for ToneEcho {
        fn fit(&mut self, _features: &Array2<f64>, _target: &Array1<f64>) -> Result<()> {
            Ok(())
        }

        fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(features.column(0).to_owned())
        }
    }

    fn wide_frame() -> DataFrame {
        let dates = vec![Date::from_ymd_opt(2021, 3, 1).unwrap()];
        DataFrame::new(vec![
            dates_to_column("event_date", &dates),
            Series::new("avg_tone_try".into(), vec![-2.0]).into_column(),
            Series::new("try_ret".into(), vec![0.01]).into_column(),
            Series::new("avg_tone_brl".into(), vec![1.5]).into_column(),
            Series::new("brl_ret".into(), vec![0.02]).into_column(),
            Series::new("avg_tone_zar".into(), vec![0.3]).into_column(),
            Series::new("zar_ret".into(), vec![-0.01]).into_column(),
        ])
        .unwrap()
    }

    #[test]
    fn test_signals_follow_model_scores() {
        let entries =
            signals_from_features(&wide_frame(), &IdentityScaler, &ToneEcho, 1).unwrap();

        // Highest tone (BRL) long, lowest (TRY) short.
        assert!(entries.long.column("BRL").unwrap().as_materialized_series().bool().unwrap().get(0).unwrap());
        assert!(!entries.long.column("TRY").unwrap().as_materialized_series().bool().unwrap().get(0).unwrap());
        assert!(entries.short.column("TRY").unwrap().as_materialized_series().bool().unwrap().get(0).unwrap());
        assert!(!entries.short.column("ZAR").unwrap().as_materialized_series().bool().unwrap().get(0).unwrap());
    }

    #[test]
    fn test_unlabeled_table_is_an_error() {
        let dates = vec![Date::from_ymd_opt(2021, 3, 1).unwrap()];
        let wide = DataFrame::new(vec![
            dates_to_column("event_date", &dates),
            Series::new("avg_tone_try".into(), vec![-2.0]).into_column(),
        ])
        .unwrap();
        assert!(matches!(
            signals_from_features(&wide, &IdentityScaler, &ToneEcho, 1),
            Err(LevanteError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_featureless_table_is_fatal() {
        let df = df! { "x" => &[1.0] }.unwrap();
        assert!(matches!(
            signals_from_features(&df, &IdentityScaler, &ToneEcho, 1),
            Err(LevanteError::NoFeatureColumns)
        ));
    }
}
