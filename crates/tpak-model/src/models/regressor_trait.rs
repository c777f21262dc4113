use anyhow::Result;

use crate::math::Array2;

/// Contract shared by the regression models the predictor can sit on.
///
/// Rows of `x` are samples already laid out in schema order (and, for the
/// predictor, already standardized).
pub trait RegressorModel {
    /// Fit on `x` against the target `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<()>;

    /// Predict one value per row.
    fn predict(&self, x: &Array2<f64>) -> Vec<f64>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "regressor"
    }
}
