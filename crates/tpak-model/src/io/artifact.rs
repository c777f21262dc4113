//! JSON persistence for the fitted scaler and linear model.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::LinearRegression;
use crate::preprocessing::Scaler;

pub const DEFAULT_SCALER_FILE: &str = "scaler.json";
pub const DEFAULT_MODEL_FILE: &str = "model_regression.json";

/// Where the scaler and model artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub scaler: PathBuf,
    pub model: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            scaler: PathBuf::from(DEFAULT_SCALER_FILE),
            model: PathBuf::from(DEFAULT_MODEL_FILE),
        }
    }
}

impl ArtifactPaths {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(scaler: P, model: Q) -> Self {
        Self {
            scaler: scaler.into(),
            model: model.into(),
        }
    }

    /// Default file names inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(
            dir.as_ref().join(DEFAULT_SCALER_FILE),
            dir.as_ref().join(DEFAULT_MODEL_FILE),
        )
    }
}

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P, what: &str) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} artifact: {}", what, path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {} artifact: {}", what, path.display()))
}

fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T, what: &str) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create {} artifact: {}", what, path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write {} artifact: {}", what, path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush {} artifact: {}", what, path.display()))
}

pub fn load_scaler<P: AsRef<Path>>(path: P) -> Result<Scaler> {
    let scaler: Scaler = read_json(&path, "scaler")?;
    scaler
        .check()
        .with_context(|| format!("Corrupt scaler artifact: {}", path.as_ref().display()))?;
    Ok(scaler)
}

pub fn save_scaler<P: AsRef<Path>>(path: P, scaler: &Scaler) -> Result<()> {
    write_json(path, scaler, "scaler")
}

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<LinearRegression> {
    let model: LinearRegression = read_json(&path, "model")?;
    model
        .check()
        .with_context(|| format!("Corrupt model artifact: {}", path.as_ref().display()))?;
    Ok(model)
}

pub fn save_model<P: AsRef<Path>>(path: P, model: &LinearRegression) -> Result<()> {
    write_json(path, model, "model")
}
