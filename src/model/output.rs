//! Normalisation of predictor output to a single finite scalar

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Raw predictor output: some model families return a bare value, others a
/// one-element array for the single input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl From<f64> for PredictionOutput {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for PredictionOutput {
    fn from(values: Vec<f64>) -> Self {
        Self::Vector(values)
    }
}

/// Coerce either output shape to one finite scalar.
///
/// Empty or multi-element containers and non-finite values are rejected.
pub fn coerce_prediction(output: PredictionOutput) -> Result<f64, ModelError> {
    let value = match output {
        PredictionOutput::Scalar(value) => value,
        PredictionOutput::Vector(values) => match values.as_slice() {
            [] => return Err(ModelError::EmptyOutput),
            [value] => *value,
            _ => return Err(ModelError::MultipleOutputs(values.len())),
        },
    };

    if !value.is_finite() {
        return Err(ModelError::NonFinite(value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_and_single_element() {
        assert_eq!(coerce_prediction(4.5.into()), Ok(4.5));
        assert_eq!(coerce_prediction(vec![4.5].into()), Ok(4.5));
    }

    #[test]
    fn test_bad_shapes_fail() {
        assert_eq!(coerce_prediction(vec![].into()), Err(ModelError::EmptyOutput));
        assert_eq!(
            coerce_prediction(vec![1.0, 2.0].into()),
            Err(ModelError::MultipleOutputs(2))
        );
    }

    #[test]
    fn test_non_finite_fails() {
        assert!(matches!(
            coerce_prediction(f64::NAN.into()),
            Err(ModelError::NonFinite(_))
        ));
        assert_eq!(
            coerce_prediction(vec![f64::INFINITY].into()),
            Err(ModelError::NonFinite(f64::INFINITY))
        );
    }

    #[test]
    fn test_untagged_json() {
        let scalar: PredictionOutput = serde_json::from_str("3.25").unwrap();
        let vector: PredictionOutput = serde_json::from_str("[3.25]").unwrap();
        assert_eq!(scalar, PredictionOutput::Scalar(3.25));
        assert_eq!(vector, PredictionOutput::Vector(vec![3.25]));
    }
}
