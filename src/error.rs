//! Error types for artifact loading, model evaluation and scenario projection

use std::path::PathBuf;

use thiserror::Error;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Failure of a single projection or artifact lookup.
///
/// A projection either returns a complete sequence or exactly one of these;
/// callers must never assume partial output exists.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Model, scaler, column list or last-values record not found on disk
    #[error("artifact missing for segment {segment}: {path}")]
    ArtifactMissing { segment: String, path: PathBuf },

    /// Artifact exists but could not be read or parsed
    #[error("artifact {path} is invalid: {details}")]
    ArtifactInvalid { path: PathBuf, details: String },

    /// Expected feature list is empty or malformed
    #[error("feature schema mismatch: {details}")]
    SchemaMismatch { details: String },

    /// Scaler or predictor failed while evaluating a step
    #[error("prediction failed at step {step}: {source}")]
    PredictionFailure {
        step: usize,
        #[source]
        source: ModelError,
    },

    /// Horizon, trend, baseline or month values outside sane bounds
    #[error("input out of range: {details}")]
    OutOfRangeInput { details: String },
}

impl SimulationError {
    pub(crate) fn out_of_range(details: impl Into<String>) -> Self {
        Self::OutOfRangeInput { details: details.into() }
    }

    pub(crate) fn schema(details: impl Into<String>) -> Self {
        Self::SchemaMismatch { details: details.into() }
    }

    /// Short stable name of the error category, used in logs and API bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ArtifactMissing { .. } => "artifact_missing",
            Self::ArtifactInvalid { .. } => "artifact_invalid",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::PredictionFailure { .. } => "prediction_failure",
            Self::OutOfRangeInput { .. } => "out_of_range_input",
        }
    }
}

/// Failure raised by a fitted predictor or feature scaler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("feature index {index} out of range for input of length {len}")]
    FeatureIndex { index: usize, len: usize },

    #[error("prediction output is empty")]
    EmptyOutput,

    #[error("prediction output has {0} values, expected exactly one")]
    MultipleOutputs(usize),

    #[error("non-finite prediction {0}")]
    NonFinite(f64),

    #[error("malformed model: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_failure_reports_step() {
        let err = SimulationError::PredictionFailure {
            step: 4,
            source: ModelError::ShapeMismatch { expected: 3, actual: 2 },
        };
        assert_eq!(err.to_string(), "prediction failed at step 4: expected 3 features, got 2");
        assert_eq!(err.kind(), "prediction_failure");
    }
}
