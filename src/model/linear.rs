//! Linear regression family (OLS / Ridge) evaluated from fitted coefficients

use super::{PredictionOutput, Predictor};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Fitted linear model: `intercept + coefficients · x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// One coefficient per scaled feature, in schema order
    pub coefficients: Vec<f64>,

    #[serde(default)]
    pub intercept: f64,
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self { coefficients, intercept }
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

impl Predictor for LinearModel {
    /// Returns a one-element vector, the shape a batch regressor yields for a
    /// single row.
    fn predict(&self, features: &[f64]) -> Result<PredictionOutput, ModelError> {
        if features.len() != self.n_features() {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        let value = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(coef, x)| coef * x)
                .sum::<f64>();

        Ok(PredictionOutput::Vector(vec![value]))
    }

    fn name(&self) -> &str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_prediction() {
        let model = LinearModel::new(vec![0.8, 0.3, -0.1], 1.2);
        let out = model.predict(&[1.0, 2.0, 3.0]).unwrap();

        match out {
            PredictionOutput::Vector(values) => {
                assert_eq!(values.len(), 1);
                assert_relative_eq!(values[0], 1.2 + 0.8 + 0.6 - 0.3, epsilon = 1e-12);
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let model = LinearModel::new(vec![1.0, 1.0], 0.0);
        assert_eq!(
            model.predict(&[1.0]),
            Err(ModelError::ShapeMismatch { expected: 2, actual: 1 })
        );
    }
}
