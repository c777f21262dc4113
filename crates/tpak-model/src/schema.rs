//! Feature schemas and named feature vectors.
//!
//! A `FeatureSchema` is the ordered list of columns the scaler and the
//! linear model were fit on. Inputs are always carried as a `FeatureVector`
//! (name -> value) and only turned into a positional row by
//! [`FeatureSchema::arrange`], so the order in which a caller assembles the
//! fields never matters.
use std::collections::BTreeMap;
use std::fmt;
use std::iter::FromIterator;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

pub const POPULATION: &str = "population_thousands";
pub const POOR_POPULATION: &str = "poor_population_thousands";
pub const SCHOOLING: &str = "avg_schooling_years";
pub const MINIMUM_WAGE: &str = "minimum_wage_rupiah";

/// Currency units per "million" as entered on the form.
pub const RUPIAH_PER_MILLION: f64 = 1_000_000.0;

/// Accepted minimum wage on the form, in millions.
pub const WAGE_MILLIONS_RANGE: (f64, f64) = (1.0, 10.0);

/// Target value the synthetic fallback model is fit on.
pub const SYNTHETIC_TARGET: f64 = 65.0;

/// A single named, unit-tagged input column with an inclusive domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub label: String,
    pub unit: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FeatureSpec {
    pub fn new(name: &str, label: &str, unit: &str, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            unit: unit.to_string(),
            min,
            max,
        }
    }

    /// Check a value against the declared domain. Both edges are accepted.
    pub fn check(&self, value: f64) -> Result<(), PredictError> {
        if !value.is_finite() {
            return Err(PredictError::invalid(&self.name, "value must be a finite number"));
        }
        if let Some(min) = self.min {
            if value < min {
                return Err(PredictError::invalid(
                    &self.name,
                    format!("{} is below the minimum of {} {}", value, min, self.unit),
                ));
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(PredictError::invalid(
                    &self.name,
                    format!("{} is above the maximum of {} {}", value, max, self.unit),
                ));
            }
        }
        Ok(())
    }
}

/// The two built-in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// Population, poor population, schooling.
    ThreeFeature,
    /// Adds the regional minimum wage.
    FourFeature,
}

impl Default for SchemaVariant {
    fn default() -> Self {
        SchemaVariant::FourFeature
    }
}

impl SchemaVariant {
    pub fn schema(&self) -> FeatureSchema {
        match self {
            SchemaVariant::ThreeFeature => FeatureSchema::three_feature(),
            SchemaVariant::FourFeature => FeatureSchema::four_feature(),
        }
    }

    /// The single made-up sample the degraded-mode model is fit on,
    /// in schema order.
    pub fn dummy_sample(&self) -> Vec<f64> {
        match self {
            SchemaVariant::ThreeFeature => vec![1500.0, 50.0, 9.0],
            SchemaVariant::FourFeature => vec![1500.0, 50.0, 9.0, 4.0 * RUPIAH_PER_MILLION],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVariant::ThreeFeature => "three_feature",
            SchemaVariant::FourFeature => "four_feature",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "three_feature" | "a" | "3" => Ok(SchemaVariant::ThreeFeature),
            "four_feature" | "b" | "4" => Ok(SchemaVariant::FourFeature),
            _ => Err(format!(
                "Unknown schema variant: {}. Expected 'three_feature' or 'four_feature'",
                s
            )),
        }
    }
}

/// Ordered list of the columns a model was fit on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    fields: Vec<FeatureSpec>,
}

impl FeatureSchema {
    pub fn new(fields: Vec<FeatureSpec>) -> Self {
        Self { fields }
    }

    pub fn three_feature() -> Self {
        Self::new(vec![
            FeatureSpec::new(POPULATION, "Population", "thousand persons", Some(1.0), None),
            FeatureSpec::new(POOR_POPULATION, "Poor population", "thousand persons", Some(0.1), None),
            FeatureSpec::new(SCHOOLING, "Average schooling", "years", Some(1.0), Some(20.0)),
        ])
    }

    pub fn four_feature() -> Self {
        Self::new(vec![
            FeatureSpec::new(POPULATION, "Population", "thousand persons", Some(1.0), Some(10_000.0)),
            FeatureSpec::new(POOR_POPULATION, "Poor population", "thousand persons", Some(0.1), Some(2_000.0)),
            FeatureSpec::new(SCHOOLING, "Average schooling", "years", Some(1.0), Some(20.0)),
            FeatureSpec::new(
                MINIMUM_WAGE,
                "Minimum wage",
                "rupiah",
                Some(WAGE_MILLIONS_RANGE.0 * RUPIAH_PER_MILLION),
                Some(WAGE_MILLIONS_RANGE.1 * RUPIAH_PER_MILLION),
            ),
        ])
    }

    pub fn fields(&self) -> &[FeatureSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FeatureSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// True when `names` lists exactly this schema's columns in fit order.
    pub fn matches(&self, names: &[String]) -> bool {
        names.len() == self.fields.len()
            && self.fields.iter().zip(names).all(|(f, n)| &f.name == n)
    }

    /// Reject vectors with missing, unknown or out-of-domain fields.
    pub fn validate(&self, features: &FeatureVector) -> Result<(), PredictError> {
        for name in features.names() {
            if !self.contains(name) {
                return Err(PredictError::invalid(name, "field is not part of the active schema"));
            }
        }
        for spec in &self.fields {
            let value = features
                .get(&spec.name)
                .ok_or_else(|| PredictError::invalid(&spec.name, "field is missing"))?;
            spec.check(value)?;
        }
        Ok(())
    }

    /// Validate and lay the values out in fit-time column order.
    pub fn arrange(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictError> {
        self.validate(features)?;
        Ok(self
            .fields
            .iter()
            .filter_map(|spec| features.get(&spec.name))
            .collect())
    }
}

/// Named feature values. Assembly order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) -> Option<f64> {
        self.values.insert(name.to_string(), value)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut out = FeatureVector::new();
        for (name, value) in iter {
            out.insert(name.as_ref(), value);
        }
        out
    }
}

/// Raw values as typed on the prediction form.
///
/// The minimum wage is entered in millions and converted to currency units
/// before it reaches the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormInputs {
    pub population_thousands: f64,
    pub poor_population_thousands: f64,
    pub avg_schooling_years: f64,
    #[serde(default)]
    pub minimum_wage_millions: Option<f64>,
}

impl Default for FormInputs {
    fn default() -> Self {
        Self {
            population_thousands: 1500.0,
            poor_population_thousands: 150.0,
            avg_schooling_years: 9.0,
            minimum_wage_millions: Some(4.0),
        }
    }
}

impl FormInputs {
    pub fn to_feature_vector(&self, schema: &FeatureSchema) -> Result<FeatureVector, PredictError> {
        let mut features = FeatureVector::new()
            .with(POPULATION, self.population_thousands)
            .with(POOR_POPULATION, self.poor_population_thousands)
            .with(SCHOOLING, self.avg_schooling_years);

        if schema.contains(MINIMUM_WAGE) {
            let wage = self
                .minimum_wage_millions
                .ok_or_else(|| PredictError::invalid(MINIMUM_WAGE, "minimum wage is required"))?;
            let (lo, hi) = WAGE_MILLIONS_RANGE;
            if !wage.is_finite() || wage < lo || wage > hi {
                return Err(PredictError::invalid(
                    MINIMUM_WAGE,
                    format!("{} million is outside [{}, {}] million", wage, lo, hi),
                ));
            }
            features.insert(MINIMUM_WAGE, wage * RUPIAH_PER_MILLION);
        } else if self.minimum_wage_millions.is_some() {
            log::debug!("Ignoring minimum wage: the active schema does not use it");
        }

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrange_binds_by_name() {
        let schema = FeatureSchema::three_feature();
        let a = FeatureVector::new()
            .with(POPULATION, 1500.0)
            .with(POOR_POPULATION, 150.0)
            .with(SCHOOLING, 9.0);
        let b = FeatureVector::new()
            .with(SCHOOLING, 9.0)
            .with(POPULATION, 1500.0)
            .with(POOR_POPULATION, 150.0);
        assert_eq!(schema.arrange(&a).unwrap(), vec![1500.0, 150.0, 9.0]);
        assert_eq!(schema.arrange(&a).unwrap(), schema.arrange(&b).unwrap());
    }

    #[test]
    fn missing_field_is_invalid() {
        let schema = FeatureSchema::three_feature();
        let v = FeatureVector::new().with(POPULATION, 1500.0).with(SCHOOLING, 9.0);
        match schema.validate(&v) {
            Err(PredictError::InvalidInput { field, .. }) => assert_eq!(field, POOR_POPULATION),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn unknown_field_is_invalid() {
        let schema = FeatureSchema::three_feature();
        let v = FeatureVector::new()
            .with(POPULATION, 1500.0)
            .with(POOR_POPULATION, 150.0)
            .with(SCHOOLING, 9.0)
            .with(MINIMUM_WAGE, 4_000_000.0);
        assert!(schema.validate(&v).is_err());
    }

    #[test]
    fn nan_is_invalid() {
        let spec = FeatureSpec::new(SCHOOLING, "Schooling", "years", Some(1.0), Some(20.0));
        assert!(spec.check(f64::NAN).is_err());
        assert!(spec.check(f64::INFINITY).is_err());
    }

    #[test]
    fn form_converts_wage_from_millions() {
        let schema = FeatureSchema::four_feature();
        let form = FormInputs {
            minimum_wage_millions: Some(4.5),
            ..FormInputs::default()
        };
        let v = form.to_feature_vector(&schema).unwrap();
        assert_eq!(v.get(MINIMUM_WAGE), Some(4_500_000.0));
    }

    #[test]
    fn form_requires_wage_for_four_feature_schema() {
        let schema = FeatureSchema::four_feature();
        let form = FormInputs {
            minimum_wage_millions: None,
            ..FormInputs::default()
        };
        assert!(form.to_feature_vector(&schema).is_err());
    }

    #[test]
    fn form_rejects_wage_outside_range() {
        let schema = FeatureSchema::four_feature();
        for wage in [0.5, 10.5] {
            let form = FormInputs {
                minimum_wage_millions: Some(wage),
                ..FormInputs::default()
            };
            assert!(form.to_feature_vector(&schema).is_err(), "wage {}", wage);
        }
    }

    #[test]
    fn form_drops_wage_for_three_feature_schema() {
        let schema = FeatureSchema::three_feature();
        let v = FormInputs::default().to_feature_vector(&schema).unwrap();
        assert_eq!(v.len(), 3);
        assert!(schema.validate(&v).is_ok());
    }

    #[test]
    fn variant_parses_aliases() {
        assert_eq!("three-feature".parse::<SchemaVariant>().unwrap(), SchemaVariant::ThreeFeature);
        assert_eq!("B".parse::<SchemaVariant>().unwrap(), SchemaVariant::FourFeature);
        assert!("five".parse::<SchemaVariant>().is_err());
    }
}
