use thiserror::Error;

/// Failures surfaced by the prediction path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// A caller-supplied feature is missing, unknown, non-finite or outside its domain.
    #[error("invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// No fitted model/scaler could be loaded or synthesized.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}

impl PredictError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PredictError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
