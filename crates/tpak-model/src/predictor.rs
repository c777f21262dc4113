//! Participation-rate predictor.
//!
//! A `Predictor` owns a fitted scaler and linear model for one feature
//! schema. It is built once (from persisted artifacts, or from a synthetic
//! single-sample fit when those cannot be read) and is immutable afterwards,
//! so a shared reference can serve any number of concurrent requests.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::io::artifact::{load_model, load_scaler, ArtifactPaths};
use crate::math::Array2;
use crate::models::{LinearRegression, RegressorModel};
use crate::preprocessing::{fit_scaler, transform_all, Scaler};
use crate::schema::{FeatureSchema, FeatureVector, FormInputs, SchemaVariant, SYNTHETIC_TARGET};

/// Bounds of a participation rate, in percent.
pub const PERCENT_RANGE: (f64, f64) = (0.0, 100.0);

/// Where the active scaler/model pair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    Persisted,
    /// Degraded mode: fit on one made-up sample.
    Synthetic,
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Persisted => f.write_str("persisted"),
            ModelSource::Synthetic => f.write_str("synthetic"),
        }
    }
}

/// Output policy applied to the raw model value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// Clamp to [0, 100].
    #[default]
    Clamp,
    /// Surface the raw linear output.
    Unclamped,
}

impl ClampPolicy {
    pub fn from_flag(clamp: bool) -> Self {
        if clamp {
            ClampPolicy::Clamp
        } else {
            ClampPolicy::Unclamped
        }
    }
}

/// A single predicted participation rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Surfaced percentage (after the clamp policy).
    pub value: f64,
    /// Raw model output.
    pub raw: f64,
    /// True when `value` differs from `raw` because of clamping.
    pub clamped: bool,
    pub source: ModelSource,
}

impl Prediction {
    /// Two-decimal percentage, as shown on the dashboard.
    pub fn display_percent(&self) -> String {
        format!("{:.2} %", self.value)
    }
}

#[derive(Debug, Clone)]
pub struct Predictor {
    schema: FeatureSchema,
    scaler: Scaler,
    model: LinearRegression,
    source: ModelSource,
    clamp: ClampPolicy,
}

impl Predictor {
    /// Assemble a predictor from already-fitted parts.
    ///
    /// Both parts must have been fit on exactly the schema's columns, in
    /// schema order.
    pub fn new(
        schema: FeatureSchema,
        scaler: Scaler,
        model: LinearRegression,
        source: ModelSource,
        clamp: ClampPolicy,
    ) -> Result<Self, PredictError> {
        if !schema.matches(&scaler.feature_names) {
            return Err(PredictError::ModelUnavailable(format!(
                "scaler was fit on {:?}, expected {:?}",
                scaler.feature_names,
                schema.names()
            )));
        }
        if !schema.matches(&model.feature_names) {
            return Err(PredictError::ModelUnavailable(format!(
                "model was fit on {:?}, expected {:?}",
                model.feature_names,
                schema.names()
            )));
        }
        scaler
            .check()
            .map_err(|e| PredictError::ModelUnavailable(format!("{:#}", e)))?;
        model
            .check()
            .map_err(|e| PredictError::ModelUnavailable(format!("{:#}", e)))?;

        Ok(Self {
            schema,
            scaler,
            model,
            source,
            clamp,
        })
    }

    /// Load the persisted scaler/model pair, failing with `ModelUnavailable`.
    pub fn load(
        paths: &ArtifactPaths,
        schema: FeatureSchema,
        clamp: ClampPolicy,
    ) -> Result<Self, PredictError> {
        let scaler = load_scaler(&paths.scaler)
            .map_err(|e| PredictError::ModelUnavailable(format!("{:#}", e)))?;
        let model = load_model(&paths.model)
            .map_err(|e| PredictError::ModelUnavailable(format!("{:#}", e)))?;
        Self::new(schema, scaler, model, ModelSource::Persisted, clamp)
    }

    /// Degraded-mode predictor fit on the variant's single dummy sample.
    pub fn synthetic(variant: SchemaVariant, clamp: ClampPolicy) -> Result<Self, PredictError> {
        let schema = variant.schema();
        let names = schema.names();
        let sample = variant.dummy_sample();

        let build = || -> anyhow::Result<(Scaler, LinearRegression)> {
            let x = Array2::from_shape_vec((1, names.len()), sample.clone())?;
            let scaler = fit_scaler(&x, &names)?;
            let x_scaled = transform_all(&x, &scaler);
            let mut model = LinearRegression::new(names.clone());
            model.fit(&x_scaled, &[SYNTHETIC_TARGET])?;
            log::debug!("Fitted synthetic {} on {:?}", model.name(), sample);
            Ok((scaler, model))
        };
        let (scaler, model) =
            build().map_err(|e| PredictError::ModelUnavailable(format!("{:#}", e)))?;

        Self::new(schema, scaler, model, ModelSource::Synthetic, clamp)
    }

    /// Prefer the persisted artifacts; fall back to the synthetic model.
    ///
    /// A missing, corrupt or schema-mismatched artifact is not fatal. The
    /// returned predictor reports which source is active.
    pub fn load_or_synthesize(
        paths: &ArtifactPaths,
        variant: SchemaVariant,
        clamp: ClampPolicy,
    ) -> Result<Self, PredictError> {
        match Self::load(paths, variant.schema(), clamp) {
            Ok(predictor) => {
                log::info!(
                    "Loaded {} model from {} and {}",
                    variant,
                    paths.scaler.display(),
                    paths.model.display()
                );
                Ok(predictor)
            }
            Err(e) => {
                log::warn!("{}; using synthetic fallback model", e);
                Self::synthetic(variant, clamp)
            }
        }
    }

    /// Predict the participation rate for one feature vector.
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, PredictError> {
        let row = self.schema.arrange(features)?;
        let scaled = self.scaler.transform_row(&row);
        let raw = self.model.predict_row(&scaled);

        // ±inf saturates under Clamp. NaN is always rejected.
        let value = match self.clamp {
            ClampPolicy::Clamp if !raw.is_nan() => raw.clamp(PERCENT_RANGE.0, PERCENT_RANGE.1),
            _ if !raw.is_finite() => return Err(self.overflow_error(&scaled)),
            ClampPolicy::Clamp | ClampPolicy::Unclamped => raw,
        };

        Ok(Prediction {
            value,
            raw,
            clamped: value != raw,
            source: self.source,
        })
    }

    /// Blame the field whose term broke the linear combination: the first
    /// non-finite term, else the largest one.
    fn overflow_error(&self, scaled: &[f64]) -> PredictError {
        let terms: Vec<f64> = self
            .model
            .weights
            .iter()
            .zip(scaled)
            .map(|(w, x)| w * x)
            .collect();
        let culprit = terms
            .iter()
            .position(|t| !t.is_finite())
            .or_else(|| {
                terms
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
                    .map(|(i, _)| i)
            });
        let field = culprit
            .and_then(|i| self.schema.fields().get(i))
            .map(|f| f.name.as_str())
            .unwrap_or("features");
        PredictError::invalid(field, "value is too large for the model to evaluate")
    }

    /// Convert raw form values (wage in millions) and predict.
    pub fn predict_form(&self, form: &FormInputs) -> Result<Prediction, PredictError> {
        let features = form.to_feature_vector(&self.schema)?;
        self.predict(&features)
    }

    /// Predict each row of a batch, stopping at the first invalid row.
    pub fn predict_many(&self, rows: &[FeatureVector]) -> Result<Vec<Prediction>, PredictError> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn model(&self) -> &LinearRegression {
        &self.model
    }

    pub fn source(&self) -> ModelSource {
        self.source
    }

    pub fn clamp(&self) -> ClampPolicy {
        self.clamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MINIMUM_WAGE, POOR_POPULATION, POPULATION, SCHOOLING};

    fn three(pop: f64, poor: f64, school: f64) -> FeatureVector {
        FeatureVector::new()
            .with(POPULATION, pop)
            .with(POOR_POPULATION, poor)
            .with(SCHOOLING, school)
    }

    fn steep_model(clamp: ClampPolicy) -> Predictor {
        let schema = FeatureSchema::three_feature();
        let names = schema.names();
        let scaler = Scaler {
            feature_names: names.clone(),
            mean: vec![1000.0, 100.0, 8.0],
            scale: vec![100.0, 10.0, 1.0],
        };
        let model = LinearRegression {
            feature_names: names,
            weights: vec![5.0, -2.0, 10.0],
            intercept: 60.0,
        };
        Predictor::new(schema, scaler, model, ModelSource::Persisted, clamp).unwrap()
    }

    #[test]
    fn synthetic_three_feature_reproduces_dummy_target() {
        let p = Predictor::synthetic(SchemaVariant::ThreeFeature, ClampPolicy::Unclamped).unwrap();
        let out = p.predict(&three(1500.0, 150.0, 9.0)).unwrap();
        assert_eq!(out.value, 65.0);
        assert_eq!(out.display_percent(), "65.00 %");
        assert_eq!(out.source, ModelSource::Synthetic);
    }

    #[test]
    fn linear_combination_of_scaled_features() {
        let p = steep_model(ClampPolicy::Unclamped);
        // scaled = (2, -1, 1) -> 60 + 10 + 2 + 10
        let out = p.predict(&three(1200.0, 90.0, 9.0)).unwrap();
        assert!((out.value - 82.0).abs() < 1e-12);
        assert!(!out.clamped);
    }

    #[test]
    fn clamp_policy_bounds_output() {
        let features = three(9000.0, 0.5, 20.0);
        let raw = steep_model(ClampPolicy::Unclamped).predict(&features).unwrap();
        assert!(raw.value > 100.0);

        let clamped = steep_model(ClampPolicy::Clamp).predict(&features).unwrap();
        assert_eq!(clamped.value, 100.0);
        assert_eq!(clamped.raw, raw.value);
        assert!(clamped.clamped);
    }

    #[test]
    fn rejects_schema_mismatch_at_construction() {
        let schema = FeatureSchema::four_feature();
        let p = steep_model(ClampPolicy::Clamp);
        let err = Predictor::new(
            schema,
            p.scaler().clone(),
            p.model().clone(),
            ModelSource::Persisted,
            ClampPolicy::Clamp,
        )
        .unwrap_err();
        assert!(matches!(err, PredictError::ModelUnavailable(_)));
    }

    #[test]
    fn four_feature_form_goes_through_wage_conversion() {
        let p = Predictor::synthetic(SchemaVariant::FourFeature, ClampPolicy::Clamp).unwrap();
        let form = FormInputs {
            population_thousands: 1500.0,
            poor_population_thousands: 200.0,
            avg_schooling_years: 9.0,
            minimum_wage_millions: Some(4.0),
        };
        let out = p.predict_form(&form).unwrap();
        assert_eq!(out.value, 65.0);

        let direct = p
            .predict(&three(1500.0, 200.0, 9.0).with(MINIMUM_WAGE, 4_000_000.0))
            .unwrap();
        assert_eq!(out, direct);
    }

    fn overflowing_model(clamp: ClampPolicy) -> Predictor {
        let schema = FeatureSchema::three_feature();
        let names = schema.names();
        let scaler = Scaler {
            feature_names: names.clone(),
            mean: vec![1000.0, 100.0, 8.0],
            scale: vec![500.0, 10.0, 1.0],
        };
        let model = LinearRegression {
            feature_names: names,
            weights: vec![1e10, -1e10, 0.0],
            intercept: 60.0,
        };
        Predictor::new(schema, scaler, model, ModelSource::Persisted, clamp).unwrap()
    }

    #[test]
    fn infinite_output_saturates_when_clamped() {
        let out = overflowing_model(ClampPolicy::Clamp)
            .predict(&three(1.7e308, 150.0, 9.0))
            .unwrap();
        assert_eq!(out.value, 100.0);
        assert!(out.clamped);

        let low = overflowing_model(ClampPolicy::Clamp)
            .predict(&three(1000.0, 1.7e308, 9.0))
            .unwrap();
        assert_eq!(low.value, 0.0);
    }

    #[test]
    fn non_finite_output_blames_the_input() {
        let err = overflowing_model(ClampPolicy::Unclamped)
            .predict(&three(1.7e308, 150.0, 9.0))
            .unwrap_err();
        assert_eq!(
            err,
            PredictError::invalid(POPULATION, "value is too large for the model to evaluate")
        );

        // inf - inf
        let err = overflowing_model(ClampPolicy::Clamp)
            .predict(&three(1.7e308, 1.7e308, 9.0))
            .unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput { ref field, .. } if field == POPULATION));
    }

    #[test]
    fn predict_many_stops_on_invalid_row() {
        let p = steep_model(ClampPolicy::Clamp);
        let rows = vec![three(1200.0, 90.0, 9.0), three(1200.0, 90.0, 0.5)];
        assert!(p.predict_many(&rows).is_err());
        assert_eq!(p.predict_many(&rows[..1]).unwrap().len(), 1);
    }
}
