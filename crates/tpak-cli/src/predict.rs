use anyhow::{Context, Result};
use serde::Serialize;

use tpak_model::{FeatureVector, Prediction, Predictor, SchemaVariant};

use crate::config::DashboardConfig;

/// One prediction as printed by `tpak predict --json`.
#[derive(Debug, Serialize)]
pub struct PredictionRecord {
    pub variant: SchemaVariant,
    pub features: FeatureVector,
    #[serde(flatten)]
    pub prediction: Prediction,
}

pub fn load_predictor(config: &DashboardConfig) -> Result<Predictor> {
    Predictor::load_or_synthesize(
        &config.artifact_paths(),
        config.variant,
        config.clamp_policy(),
    )
    .context("Failed to build predictor")
}

fn predict_record(config: &DashboardConfig, predictor: &Predictor) -> Result<PredictionRecord> {
    let features = config.inputs.to_feature_vector(predictor.schema())?;
    let prediction = predictor.predict(&features)?;
    Ok(PredictionRecord {
        variant: config.variant,
        features,
        prediction,
    })
}

pub fn run_predict(config: &DashboardConfig, as_json: bool) -> Result<()> {
    let predictor = load_predictor(config)?;
    let record = predict_record(config, &predictor)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!(
            "Predicted participation rate: {} ({} model)",
            record.prediction.display_percent(),
            record.prediction.source
        );
        if record.prediction.clamped {
            println!(
                "Raw model output {:.2} was clamped to [0, 100]",
                record.prediction.raw
            );
        }
    }
    Ok(())
}
