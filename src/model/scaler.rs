//! Fitted feature scalers carrying their expected feature order

use super::FeatureScaler;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Standardisation: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(feature_names: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { feature_names, mean, scale }
    }

    fn check_width(&self, actual: usize) -> Result<(), ModelError> {
        if self.mean.len() != self.scale.len() {
            return Err(ModelError::Malformed(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if actual != self.mean.len() {
            return Err(ModelError::ShapeMismatch { expected: self.mean.len(), actual });
        }
        Ok(())
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.check_width(features.len())?;

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant columns were fitted with zero variance
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Min-max normalisation into `feature_range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
}

impl MinMaxScaler {
    pub fn new(feature_names: Vec<String>, data_min: Vec<f64>, data_max: Vec<f64>) -> Self {
        Self {
            feature_names,
            data_min,
            data_max,
            feature_range: default_feature_range(),
        }
    }
}

impl FeatureScaler for MinMaxScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if self.data_min.len() != self.data_max.len() {
            return Err(ModelError::Malformed(format!(
                "scaler has {} minimums but {} maximums",
                self.data_min.len(),
                self.data_max.len()
            )));
        }
        if features.len() != self.data_min.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.data_min.len(),
                actual: features.len(),
            });
        }

        let (lo, hi) = self.feature_range;
        Ok(features
            .iter()
            .zip(self.data_min.iter().zip(&self.data_max))
            .map(|(x, (min, max))| {
                let span = if max - min == 0.0 { 1.0 } else { max - min };
                (x - min) / span * (hi - lo) + lo
            })
            .collect())
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_standard_scaler() {
        let scaler = StandardScaler::new(
            names(&["a", "b", "c"]),
            vec![10.0, 0.5, 3.0],
            vec![2.0, 0.25, 0.0],
        );
        let out = scaler.transform(&[14.0, 0.0, 5.0]).unwrap();

        assert_relative_eq!(out[0], 2.0);
        assert_relative_eq!(out[1], -2.0);
        // Zero scale leaves the centred value untouched
        assert_relative_eq!(out[2], 2.0);
    }

    #[test]
    fn test_standard_scaler_width() {
        let scaler = StandardScaler::new(Vec::new(), vec![0.0, 0.0], vec![1.0, 1.0]);
        assert_eq!(
            scaler.transform(&[1.0, 2.0, 3.0]),
            Err(ModelError::ShapeMismatch { expected: 2, actual: 3 })
        );

        let broken = StandardScaler::new(Vec::new(), vec![0.0, 0.0], vec![1.0]);
        assert!(matches!(broken.transform(&[1.0, 2.0]), Err(ModelError::Malformed(_))));
    }

    #[test]
    fn test_min_max_scaler() {
        let mut scaler =
            MinMaxScaler::new(names(&["selic", "mes"]), vec![2.0, 1.0], vec![22.0, 1.0]);
        let out = scaler.transform(&[12.0, 1.0]).unwrap();
        assert_relative_eq!(out[0], 0.5);
        assert_relative_eq!(out[1], 0.0);

        scaler.feature_range = (-1.0, 1.0);
        let out = scaler.transform(&[22.0, 1.0]).unwrap();
        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[1], -1.0);
    }
}
