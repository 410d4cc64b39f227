//! Fitted model collaborators: predictor and feature scaler contracts
//!
//! Training happens elsewhere; this module only evaluates already-fitted
//! artifacts. Both contracts are `Send + Sync` so one loaded artifact can be
//! shared read-only across concurrent projections.

mod output;
mod linear;
mod tree;
mod scaler;

pub use output::{coerce_prediction, PredictionOutput};
pub use linear::LinearModel;
pub use tree::{Aggregation, RegressionTree, TreeEnsemble, TreeNode};
pub use scaler::{MinMaxScaler, StandardScaler};

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// A fitted regression model evaluated on one already-scaled feature row
pub trait Predictor: Send + Sync {
    /// Predict the target for one row. May return a bare scalar or a container.
    fn predict(&self, features: &[f64]) -> Result<PredictionOutput, ModelError>;

    /// Model family name, used in logs
    fn name(&self) -> &str;
}

/// A fitted preprocessing transform with a known expected input schema
pub trait FeatureScaler: Send + Sync {
    /// Transform one row ordered by [`FeatureScaler::feature_names`]
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;

    /// Feature names in the order the scaler was fitted on (may be empty)
    fn feature_names(&self) -> &[String];
}

/// On-disk form of a fitted model, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl Predictor for ModelArtifact {
    fn predict(&self, features: &[f64]) -> Result<PredictionOutput, ModelError> {
        match self {
            Self::Linear(model) => model.predict(features),
            Self::TreeEnsemble(model) => model.predict(features),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Linear(model) => model.name(),
            Self::TreeEnsemble(model) => model.name(),
        }
    }
}

/// On-disk form of a fitted scaler, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

impl FeatureScaler for ScalerArtifact {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        match self {
            Self::Standard(scaler) => scaler.transform(features),
            Self::MinMax(scaler) => scaler.transform(features),
        }
    }

    fn feature_names(&self) -> &[String] {
        match self {
            Self::Standard(scaler) => scaler.feature_names(),
            Self::MinMax(scaler) => scaler.feature_names(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_artifact_from_json() {
        let json = r#"{"kind": "linear", "coefficients": [0.5, -1.0], "intercept": 2.0}"#;
        let model: ModelArtifact = serde_json::from_str(json).unwrap();

        let out = coerce_prediction(model.predict(&[2.0, 1.0]).unwrap()).unwrap();
        assert_eq!(out, 2.0);
        assert_eq!(model.name(), "linear");
    }

    #[test]
    fn test_scaler_artifact_from_json() {
        let json = r#"{
            "kind": "standard",
            "feature_names": ["selic_lag_6", "target_lag_1"],
            "mean": [10.0, 3.0],
            "scale": [2.0, 0.5]
        }"#;
        let scaler: ScalerArtifact = serde_json::from_str(json).unwrap();

        assert_eq!(scaler.feature_names(), ["selic_lag_6", "target_lag_1"]);
        assert_eq!(scaler.transform(&[12.0, 2.5]).unwrap(), vec![1.0, -1.0]);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let json = r#"{"kind": "neural_net", "weights": []}"#;
        assert!(serde_json::from_str::<ModelArtifact>(json).is_err());
    }
}
