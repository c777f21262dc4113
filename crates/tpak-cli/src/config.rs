use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use tpak_model::io::artifact::{ArtifactPaths, DEFAULT_MODEL_FILE, DEFAULT_SCALER_FILE};
use tpak_model::io::DatasetPaths;
use tpak_model::{ClampPolicy, FormInputs, SchemaVariant};

use crate::util::{arg_flag, arg_value};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DashboardConfig {
    pub version: String,
    /// `three_feature` or `four_feature`.
    pub variant: SchemaVariant,
    pub scaler_path: PathBuf,
    pub model_path: PathBuf,
    /// Clamp predictions to [0, 100].
    pub clamp: bool,
    /// Form values used when no prediction flags are given.
    pub inputs: FormInputs,
    /// Regional indicator tables for the data-exploration view and evaluation.
    pub datasets: DatasetPaths,
    pub report_file: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            version: clap::crate_version!().to_string(),
            variant: SchemaVariant::FourFeature,
            scaler_path: PathBuf::from(DEFAULT_SCALER_FILE),
            model_path: PathBuf::from(DEFAULT_MODEL_FILE),
            clamp: true,
            inputs: FormInputs::default(),
            datasets: DatasetPaths::default(),
            report_file: PathBuf::from("tpak_dashboard.html"),
        }
    }
}

impl DashboardConfig {
    pub fn from_arguments(config_path: &PathBuf, matches: &ArgMatches) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;
        config.apply_overrides(matches)?;
        Ok(config)
    }

    /// Read a config file. Missing or invalid fields keep their defaults.
    pub fn from_file(config_path: &PathBuf) -> Result<Self> {
        let config_json = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let partial: serde_json::Value = serde_json::from_str(&config_json)
            .with_context(|| format!("Config file is not valid JSON: {:?}", config_path))?;
        let mut config = DashboardConfig::default();

        macro_rules! load_or_default {
            ($field:ident) => {
                if let Some(val) = partial.get(stringify!($field)) {
                    if let Ok(parsed) = serde_json::from_value(val.clone()) {
                        config.$field = parsed;
                    } else {
                        log::warn!(
                            "Config Invalid value for '{}', using default: {:?}",
                            stringify!($field),
                            config.$field
                        );
                    }
                } else {
                    log::warn!(
                        "Config Missing field '{}', using default: {:?}",
                        stringify!($field),
                        config.$field
                    );
                }
            };
        }

        load_or_default!(variant);
        load_or_default!(scaler_path);
        load_or_default!(model_path);
        load_or_default!(clamp);
        load_or_default!(inputs);
        load_or_default!(datasets);
        load_or_default!(report_file);

        Ok(config)
    }

    /// Command-line values win over the file.
    pub fn apply_overrides(&mut self, matches: &ArgMatches) -> Result<()> {
        if let Some(variant) = arg_value::<String>(matches, "variant") {
            self.variant = variant.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(scaler) = arg_value::<PathBuf>(matches, "scaler_path") {
            self.scaler_path = scaler.clone();
        }
        if let Some(model) = arg_value::<PathBuf>(matches, "model_path") {
            self.model_path = model.clone();
        }
        if arg_flag(matches, "no_clamp") {
            self.clamp = false;
        }
        if let Some(report_file) = arg_value::<PathBuf>(matches, "output_file") {
            self.report_file = report_file.clone();
        }

        if let Some(v) = arg_value::<f64>(matches, "population") {
            self.inputs.population_thousands = *v;
        }
        if let Some(v) = arg_value::<f64>(matches, "poor") {
            self.inputs.poor_population_thousands = *v;
        }
        if let Some(v) = arg_value::<f64>(matches, "schooling") {
            self.inputs.avg_schooling_years = *v;
        }
        if let Some(v) = arg_value::<f64>(matches, "wage") {
            self.inputs.minimum_wage_millions = Some(*v);
        }
        Ok(())
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.scaler_path, &self.model_path)
    }

    pub fn clamp_policy(&self) -> ClampPolicy {
        ClampPolicy::from_flag(self.clamp)
    }

    /// Pretty JSON of the default config, for `tpak <cmd>` without a file.
    pub fn template_json() -> Result<String> {
        serde_json::to_string_pretty(&DashboardConfig::default())
            .context("Failed to serialize default config")
    }
}
