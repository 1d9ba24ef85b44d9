//! Per-column standardizing scaler.

use levante_traits::{FeatureScaler, LevanteError, Result};
use ndarray::{Array1, Array2, Axis};

/// Z-score scaler: subtract the column mean, divide by the column
/// standard deviation. Constant columns pass through centered only.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    fitted: Option<(Array1<f64>, Array1<f64>)>,
}

impl StandardScaler {
    /// Create an unfitted scaler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        let (means, stds) = self
            .fitted
            .as_ref()
            .ok_or_else(|| LevanteError::Model("scaler has not been fitted".to_string()))?;
        if features.ncols() != means.len() {
            return Err(LevanteError::Model(format!(
                "scaler fitted on {} columns, got {}",
                means.len(),
                features.ncols()
            )));
        }
        let mut out = features.clone();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            column.mapv_inplace(|v| (v - means[j]) / stds[j]);
        }
        Ok(out)
    }
}

impl FeatureScaler for StandardScaler {
    fn fit_transform(&mut self, features: &Array2<f64>) -> Result<Array2<f64>> {
        if features.nrows() == 0 {
            return Err(LevanteError::InsufficientData(
                "cannot fit a scaler on an empty matrix".to_string(),
            ));
        }
        let n = features.nrows() as f64;
        let means: Array1<f64> = features.sum_axis(Axis(0)) / n;
        let stds: Array1<f64> = features
            .axis_iter(Axis(1))
            .zip(means.iter())
            .map(|(column, mean)| {
                let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = variance.sqrt();
                if std > 0.0 { std } else { 1.0 }
            })
            .collect();

        self.fitted = Some((means, stds));
        self.apply(features)
    }

    fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        self.apply(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_fit_transform_standardizes_columns() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        for j in 0..2 {
            let column = scaled.column(j);
            let mean = column.sum() / 3.0;
            let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
            assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
            assert_relative_eq!(variance, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_transform_uses_fitted_parameters() {
        let x = array![[1.0], [3.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit_transform(&x).unwrap();

        // mean 2, std 1: 5 scales to 3.
        let out = scaler.transform(&array![[5.0]]).unwrap();
        assert_relative_eq!(out[[0, 0]], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unfitted_transform_is_an_error() {
        let scaler = StandardScaler::new();
        assert!(scaler.transform(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_constant_column_does_not_divide_by_zero() {
        let x = array![[5.0], [5.0], [5.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        for v in scaled.iter() {
            assert!(v.is_finite());
            assert_relative_eq!(*v, 0.0);
        }
    }

    #[test]
    fn test_column_count_mismatch_is_an_error() {
        let mut scaler = StandardScaler::new();
        scaler.fit_transform(&array![[1.0, 2.0]]).unwrap();
        assert!(scaler.transform(&array![[1.0]]).is_err());
    }
}
