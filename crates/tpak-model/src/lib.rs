//! tpak-model: labor force participation rate (TPaK) prediction.
//!
//! The crate bundles a feature schema for the two published model variants,
//! a standard scaler, an ordinary least squares regressor, and a
//! [`predictor::Predictor`] that ties them together with a persisted/synthetic
//! loading policy. Around that core sit artifact and regional-table IO,
//! regression metrics, and an HTML dashboard rendered with maud and plotly.
pub mod error;
pub mod io;
pub mod math;
pub mod metrics;
pub mod models;
pub mod predictor;
pub mod preprocessing;
pub mod report;
pub mod schema;

pub use error::PredictError;
pub use predictor::{ClampPolicy, ModelSource, Prediction, Predictor};
pub use schema::{FeatureSchema, FeatureVector, FormInputs, SchemaVariant};
