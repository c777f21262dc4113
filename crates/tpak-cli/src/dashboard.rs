use anyhow::Result;

use tpak_model::io::load_datasets;
use tpak_model::report::{save_dashboard, DashboardContext};

use crate::config::DashboardConfig;
use crate::evaluate::compute_metrics;
use crate::predict::load_predictor;
use crate::util::validate_html_output;

pub fn run_dashboard(config: &DashboardConfig) -> Result<()> {
    validate_html_output(&config.report_file)?;

    let predictor = load_predictor(config)?;
    let dataset = load_datasets(&config.datasets)?;
    let metrics = compute_metrics(&predictor, dataset.as_ref());

    // Invalid form values are rendered in the Prediction section.
    let prediction = config
        .inputs
        .to_feature_vector(predictor.schema())
        .and_then(|features| predictor.predict(&features).map(|p| (features, p)));
    if let Err(e) = &prediction {
        log::warn!("Prediction inputs rejected: {}", e);
    }

    let ctx = DashboardContext {
        app_name: "tpak".to_string(),
        version: config.version.clone(),
        predictor: &predictor,
        metrics,
        dataset: dataset.as_ref(),
        prediction: Some(prediction),
    };
    save_dashboard(&ctx, &config.report_file)
}
