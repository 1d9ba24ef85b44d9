//! Regression-model interfaces.
//!
//! Signal construction is decoupled from model choice: anything that can
//! fit a feature matrix against a target vector and predict from new
//! features plugs into the pipeline. The concrete baseline lives in
//! `levante-model`; tests substitute trivial fakes.

use ndarray::{Array1, Array2};

use crate::Result;

/// Fixed feature-column order fed to scalers and regressors.
///
/// Every producer and consumer of feature matrices in the pipeline agrees
/// on this order; reordering it is a breaking change.
pub const FEATURE_ORDER: [&str; 3] = ["avg_tone", "event_count", "tone_dispersion"];

/// A supervised regressor predicting next-day currency returns.
///
/// Implementations must be thread-safe; the pipeline may score several
/// cross-sections concurrently.
pub trait Regressor: Send + Sync {
    /// Fit the model on a feature matrix (rows = observations, columns in
    /// [`FEATURE_ORDER`]) against the realized-return target vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes disagree or the fit is degenerate.
    fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()>;

    /// Predict returns for a feature matrix with the same column layout
    /// the model was fitted on.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been fitted or the column
    /// count disagrees with the fit.
    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>>;
}

/// A feature scaler applied before fitting and before every prediction.
pub trait FeatureScaler: Send + Sync {
    /// Learn scaling parameters from `features` and return the scaled copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is empty.
    fn fit_transform(&mut self, features: &Array2<f64>) -> Result<Array2<f64>>;

    /// Scale `features` with previously learned parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler has not been fitted or the column
    /// count disagrees with the fit.
    fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order() {
        assert_eq!(FEATURE_ORDER, ["avg_tone", "event_count", "tone_dispersion"]);
    }

    #[test]
    fn test_traits_are_object_safe() {
        fn _accept_regressor(_r: &dyn Regressor) {}
        fn _accept_scaler(_s: &dyn FeatureScaler) {}
    }
}
