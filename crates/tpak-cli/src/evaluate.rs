use anyhow::Result;

use tpak_model::io::{load_datasets, MergedDataset};
use tpak_model::metrics::{evaluate_predictor, EvaluationMetrics};
use tpak_model::Predictor;

use crate::config::DashboardConfig;
use crate::predict::load_predictor;

/// Metrics on the joined dataset rows, or the reference values when there
/// are no usable rows.
pub fn compute_metrics(predictor: &Predictor, dataset: Option<&MergedDataset>) -> EvaluationMetrics {
    let rows = dataset
        .map(|d| d.feature_rows(predictor.schema()))
        .unwrap_or_default();
    if rows.is_empty() {
        log::info!("No labelled rows available; showing reference metrics");
        return EvaluationMetrics::reference();
    }
    match evaluate_predictor(predictor, &rows) {
        Ok(metrics) => metrics,
        Err(e) => {
            log::warn!("Evaluation failed, showing reference metrics: {:#}", e);
            EvaluationMetrics::reference()
        }
    }
}

pub fn run_evaluate(config: &DashboardConfig, as_json: bool) -> Result<()> {
    let predictor = load_predictor(config)?;
    let dataset = load_datasets(&config.datasets)?;
    let metrics = compute_metrics(&predictor, dataset.as_ref());

    if as_json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!("MAE:  {:.3}", metrics.mae);
        println!("MSE:  {:.3}", metrics.mse);
        println!("RMSE: {:.3}", metrics.rmse);
        println!("R2:   {:.3}", metrics.r2);
        println!("Source: {} ({} model)", metrics.source, predictor.source());
    }
    Ok(())
}
