//! Closed-form ridge regressor.
//!
//! Three features and an intercept make the normal-equations system a
//! 4×4 solve; no iterative optimizer needed. The L2 penalty keeps the
//! solution stable on the near-collinear days the sentiment features
//! occasionally produce.

use levante_traits::{LevanteError, Regressor, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Configuration for the ridge regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeConfig {
    /// L2 penalty applied to the feature weights (not the intercept).
    pub lambda: f64,
}

impl Default for RidgeConfig {
    fn default() -> Self {
        Self { lambda: 1e-3 }
    }
}

/// Linear model `y = x·w + b` fitted by penalized normal equations.
#[derive(Debug, Clone, Default)]
pub struct RidgeRegressor {
    config: RidgeConfig,
    weights: Option<Array1<f64>>,
    intercept: f64,
}

impl RidgeRegressor {
    /// Create an unfitted regressor.
    #[must_use]
    pub fn new(config: RidgeConfig) -> Self {
        Self {
            config,
            weights: None,
            intercept: 0.0,
        }
    }

    /// Fitted feature weights, if any.
    #[must_use]
    pub const fn weights(&self) -> Option<&Array1<f64>> {
        self.weights.as_ref()
    }
}

impl Regressor for RidgeRegressor {
    fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
        let n = features.nrows();
        let d = features.ncols();
        if n == 0 || d == 0 {
            return Err(LevanteError::InsufficientData(
                "cannot fit on an empty matrix".to_string(),
            ));
        }
        if target.len() != n {
            return Err(LevanteError::Model(format!(
                "{n} feature rows but {} targets",
                target.len()
            )));
        }

        // Augmented design: features plus a trailing bias column.
        let mut gram = Array2::<f64>::zeros((d + 1, d + 1));
        let mut moment = Array1::<f64>::zeros(d + 1);
        for i in 0..n {
            for j in 0..=d {
                let xj = if j < d { features[[i, j]] } else { 1.0 };
                moment[j] += xj * target[i];
                for k in 0..=d {
                    let xk = if k < d { features[[i, k]] } else { 1.0 };
                    gram[[j, k]] += xj * xk;
                }
            }
        }
        for j in 0..d {
            gram[[j, j]] += self.config.lambda;
        }

        let solution = solve_linear(gram, moment).ok_or_else(|| {
            LevanteError::Model("singular normal-equations system".to_string())
        })?;

        self.intercept = solution[d];
        self.weights = Some(solution.slice(ndarray::s![..d]).to_owned());
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| LevanteError::Model("regressor has not been fitted".to_string()))?;
        if features.ncols() != weights.len() {
            return Err(LevanteError::Model(format!(
                "model fitted on {} columns, got {}",
                weights.len(),
                features.ncols()
            )));
        }
        Ok(features.dot(weights) + self.intercept)
    }
}

/// Solve `a·x = b` by Gaussian elimination with partial pivoting.
fn solve_linear(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        // Pivot on the largest remaining magnitude.
        let pivot = (col..n).max_by(|&i, &j| {
            a[[i, col]]
                .abs()
                .partial_cmp(&a[[j, col]].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                let tmp = a[[col, k]];
                a[[col, k]] = a[[pivot, k]];
                a[[pivot, k]] = tmp;
            }
            b.swap(col, pivot);
        }
        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[[row, k]] * x[k];
        }
        x[row] = sum / a[[row, row]];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_solve_linear() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![5.0, 10.0];
        let x = solve_linear(a, b).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_solve_linear_singular() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert!(solve_linear(a, b).is_none());
    }

    #[test]
    fn test_recovers_linear_relation() {
        // y = 2·x0 − x1 + 0.5 on a small grid.
        let mut features = Vec::new();
        let mut target = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                let x0 = f64::from(i) / 3.0;
                let x1 = f64::from(j) / 5.0;
                features.push([x0, x1]);
                target.push(2.0 * x0 - x1 + 0.5);
            }
        }
        let x = Array2::from_shape_fn((100, 2), |(r, c)| features[r][c]);
        let y = Array1::from_vec(target);

        let mut model = RidgeRegressor::new(RidgeConfig { lambda: 1e-8 });
        model.fit(&x, &y).unwrap();

        let weights = model.weights().unwrap();
        assert_relative_eq!(weights[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(weights[1], -1.0, epsilon = 1e-4);

        let pred = model.predict(&array![[1.0, 1.0]]).unwrap();
        assert_relative_eq!(pred[0], 1.5, epsilon = 1e-4);
    }

    #[test]
    fn test_unfitted_predict_is_an_error() {
        let model = RidgeRegressor::default();
        assert!(model.predict(&array![[1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let mut model = RidgeRegressor::default();
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![1.0];
        assert!(model.fit(&x, &y).is_err());
    }
}
