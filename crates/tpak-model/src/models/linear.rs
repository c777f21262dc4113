//! Ordinary least squares linear regression.
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::math::{dot, mean, Array2};
use crate::models::regressor_trait::RegressorModel;

/// Weight per feature plus an intercept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    /// Relative pivot size under which a column is treated as linearly dependent.
    const PIVOT_TOL: f64 = 1e-10;

    pub fn new(feature_names: Vec<String>) -> Self {
        LinearRegression {
            feature_names,
            weights: Vec::new(),
            intercept: 0.0,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.weights.is_empty() && self.weights.len() == self.feature_names.len()
    }

    /// Shapes agree and every parameter is finite.
    pub fn check(&self) -> Result<()> {
        ensure!(
            self.is_fitted(),
            "model has {} weights for {} features",
            self.weights.len(),
            self.feature_names.len()
        );
        ensure!(
            self.intercept.is_finite() && self.weights.iter().all(|w| w.is_finite()),
            "model parameters contain non-finite values"
        );
        Ok(())
    }

    /// `intercept + Σ wᵢ xᵢ` for one row in fit order.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        assert_eq!(
            row.len(),
            self.weights.len(),
            "predict_row: expected {} features",
            self.weights.len()
        );
        self.intercept + dot(&self.weights, row)
    }
}

impl RegressorModel for LinearRegression {
    /// Fit on centred data via the normal equations.
    ///
    /// Columns that turn out linearly dependent (including every column when
    /// there is a single sample) get a weight of 0, so the intercept absorbs
    /// the target mean.
    fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        ensure!(n_samples > 0, "Cannot fit with zero samples");
        ensure!(
            n_samples == y.len(),
            "Number of samples ({}) must match target length ({})",
            n_samples,
            y.len()
        );
        ensure!(
            n_features == self.feature_names.len(),
            "Got {} columns for {} feature names",
            n_features,
            self.feature_names.len()
        );
        ensure!(
            y.iter().all(|v| v.is_finite()),
            "Target contains non-finite values"
        );

        let x_mean = x.column_means();
        let y_mean = mean(y).unwrap_or(0.0);

        let mut centred = x.clone();
        for r in 0..n_samples {
            for c in 0..n_features {
                centred[(r, c)] -= x_mean[c];
            }
        }
        let y_centred: Vec<f64> = y.iter().map(|v| v - y_mean).collect();

        let gram = centred.gram();
        let rhs = centred.t_dot(&y_centred);
        let weights = solve_normal_equations(gram, rhs, Self::PIVOT_TOL);

        self.intercept = y_mean - dot(&weights, &x_mean);
        self.weights = weights;
        log::debug!(
            "Fitted OLS on {} samples: weights={:?}, intercept={}",
            n_samples,
            self.weights,
            self.intercept
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Vec<f64> {
        (0..x.nrows()).map(|r| self.predict_row(x.row_slice(r))).collect()
    }

    fn name(&self) -> &str {
        "ols_linear_regression"
    }
}

/// Gauss-Jordan elimination with partial pivoting on `a w = b`.
///
/// Free columns (no usable pivot) are set to 0.
fn solve_normal_equations(mut a: Array2<f64>, mut b: Vec<f64>, rel_tol: f64) -> Vec<f64> {
    let p = a.nrows();
    let scale = (0..p).map(|i| a[(i, i)].abs()).fold(1.0, f64::max);
    let tol = rel_tol * scale;

    let mut pivot_row_of_col: Vec<Option<usize>> = vec![None; p];
    let mut row = 0;
    for col in 0..p {
        if row == p {
            break;
        }
        let (best, best_abs) = (row..p)
            .map(|r| (r, a[(r, col)].abs()))
            .fold((row, -1.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
        if best_abs <= tol {
            continue;
        }

        if best != row {
            for k in 0..p {
                let tmp = a[(row, k)];
                a[(row, k)] = a[(best, k)];
                a[(best, k)] = tmp;
            }
            b.swap(row, best);
        }

        let pivot = a[(row, col)];
        for k in col..p {
            a[(row, k)] /= pivot;
        }
        b[row] /= pivot;

        for r in 0..p {
            if r == row {
                continue;
            }
            let factor = a[(r, col)];
            if factor == 0.0 {
                continue;
            }
            for k in col..p {
                a[(r, k)] -= factor * a[(row, k)];
            }
            b[r] -= factor * b[row];
        }

        pivot_row_of_col[col] = Some(row);
        row += 1;
    }

    pivot_row_of_col
        .into_iter()
        .map(|r| r.map(|r| b[r]).unwrap_or(0.0))
        .collect()
}
