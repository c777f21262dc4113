//! Feature standardization.
//!
//! `Scaler` holds a per-column mean and scale fit on the training matrix and
//! applies `(x - mean) / scale` to each incoming row. Columns with no
//! variance get a scale of 1 so a single-sample fit maps its own sample to
//! the zero vector.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::math::Array2;

/// Standard scaler (per-column mean / population std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    /// Below this a column is treated as constant.
    const MIN_STD: f64 = 1e-12;

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Shapes agree and every scale is usable as a divisor.
    pub fn check(&self) -> Result<()> {
        ensure!(
            self.mean.len() == self.scale.len() && self.mean.len() == self.feature_names.len(),
            "scaler has {} names, {} means and {} scales",
            self.feature_names.len(),
            self.mean.len(),
            self.scale.len()
        );
        ensure!(
            self.mean.iter().all(|m| m.is_finite()),
            "scaler mean contains non-finite values"
        );
        ensure!(
            self.scale.iter().all(|s| s.is_finite() && *s > 0.0),
            "scaler scale must be finite and positive"
        );
        Ok(())
    }

    /// Standardize one row laid out in fit order.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        assert_eq!(
            row.len(),
            self.n_features(),
            "transform_row: expected {} features",
            self.n_features()
        );
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }
}

/// Fit a `Scaler` on `x` (rows are samples, columns are features).
pub fn fit_scaler(x: &Array2<f64>, feature_names: &[String]) -> Result<Scaler> {
    let (nrows, ncols) = x.shape();
    ensure!(nrows > 0 && ncols > 0, "fit_scaler requires a non-empty matrix");
    ensure!(
        feature_names.len() == ncols,
        "fit_scaler: {} feature names for {} columns",
        feature_names.len(),
        ncols
    );

    let mut mean = Vec::with_capacity(ncols);
    let mut scale = Vec::with_capacity(ncols);
    for c in 0..ncols {
        let column = x.column(c);
        mean.push(column.iter().mean());
        let std = column.iter().population_std_dev();
        scale.push(if std.is_finite() && std > Scaler::MIN_STD { std } else { 1.0 });
    }

    Ok(Scaler {
        feature_names: feature_names.to_vec(),
        mean,
        scale,
    })
}

/// Transform every row of `x` with `sc`.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Array2<f64> {
    let (nrows, ncols) = x.shape();
    let mut out = Array2::zeros(nrows, ncols);
    for r in 0..nrows {
        for (c, v) in sc.transform_row(x.row_slice(r)).into_iter().enumerate() {
            out[(r, c)] = v;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn fit_scaler_computes_mean_and_std() {
        let x = Array2::from_shape_vec((4, 2), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0]).unwrap();
        let sc = fit_scaler(&x, &names(2)).unwrap();
        assert!((sc.mean[0] - 2.5).abs() < 1e-12);
        assert!((sc.mean[1] - 25.0).abs() < 1e-12);
        // population std of 1..4
        assert!((sc.scale[0] - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_sample_maps_to_zero() {
        let x = Array2::from_shape_vec((1, 3), vec![1500.0, 50.0, 9.0]).unwrap();
        let sc = fit_scaler(&x, &names(3)).unwrap();
        assert_eq!(sc.scale, vec![1.0, 1.0, 1.0]);
        assert_eq!(sc.transform_row(&[1500.0, 50.0, 9.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(sc.transform_row(&[1500.0, 150.0, 9.0]), vec![0.0, 100.0, 0.0]);
    }

    #[test]
    fn transform_all_centers_data() {
        let x = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let sc = fit_scaler(&x, &names(1)).unwrap();
        let t = transform_all(&x, &sc);
        let mean: f64 = (0..4).map(|r| t[(r, 0)]).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
    }

    #[test]
    fn fit_rejects_name_mismatch() {
        let x = Array2::from_shape_vec((1, 2), vec![1.0, 2.0]).unwrap();
        assert!(fit_scaler(&x, &names(3)).is_err());
    }

    #[test]
    fn check_rejects_zero_scale() {
        let sc = Scaler {
            feature_names: names(1),
            mean: vec![0.0],
            scale: vec![0.0],
        };
        assert!(sc.check().is_err());
    }
}
