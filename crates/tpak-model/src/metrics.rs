//! Regression evaluation metrics.
//!
//! The published dashboard shows four fixed numbers. They are kept here as
//! [`EvaluationMetrics::reference`] and labelled as such; numbers computed
//! from data carry [`MetricsSource::Computed`].
use std::fmt;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::predictor::Predictor;
use crate::schema::FeatureVector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricsSource {
    /// Static values reported for the published model.
    Reference,
    /// Computed on `samples` labelled rows.
    Computed { samples: usize },
}

impl fmt::Display for MetricsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsSource::Reference => f.write_str("static reference values"),
            MetricsSource::Computed { samples } => write!(f, "computed on {} samples", samples),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
    pub source: MetricsSource,
}

impl EvaluationMetrics {
    pub fn reference() -> Self {
        Self {
            mae: 3.067,
            mse: 14.614,
            rmse: 3.822,
            r2: 0.157,
            source: MetricsSource::Reference,
        }
    }
}

/// MAE, MSE, RMSE and R² of `predicted` against `truth`.
///
/// R² is NaN when the truth has no variance and the fit is not exact.
pub fn evaluate(truth: &[f64], predicted: &[f64]) -> Result<EvaluationMetrics> {
    ensure!(
        truth.len() == predicted.len(),
        "truth ({}) and predictions ({}) must have equal lengths",
        truth.len(),
        predicted.len()
    );
    ensure!(!truth.is_empty(), "cannot evaluate on zero samples");

    let n = truth.len() as f64;
    let residuals: Vec<f64> = truth.iter().zip(predicted).map(|(t, p)| t - p).collect();
    let mae = residuals.iter().map(|r| r.abs()).sum::<f64>() / n;
    let ss_res = residuals.iter().map(|r| r * r).sum::<f64>();
    let mse = ss_res / n;

    let mean = truth.iter().mean();
    let ss_tot = truth.iter().map(|t| (t - mean).powi(2)).sum::<f64>();
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        f64::NAN
    };

    Ok(EvaluationMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        r2,
        source: MetricsSource::Computed {
            samples: truth.len(),
        },
    })
}

/// Score a predictor on labelled rows using its raw (unclamped) output.
///
/// Rows the predictor rejects as out of domain are skipped and counted in
/// the log.
pub fn evaluate_predictor(
    predictor: &Predictor,
    rows: &[(FeatureVector, f64)],
) -> Result<EvaluationMetrics> {
    let mut truth = Vec::with_capacity(rows.len());
    let mut predicted = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for (features, target) in rows {
        match predictor.predict(features) {
            Ok(p) => {
                truth.push(*target);
                predicted.push(p.raw);
            }
            Err(e) => {
                log::debug!("Skipping row during evaluation: {}", e);
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        log::warn!("{} of {} rows were outside the model domain", skipped, rows.len());
    }
    evaluate(&truth, &predicted)
}
