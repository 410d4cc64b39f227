//! Tree ensembles: bagged forests (mean of trees) and boosted trees (sum)

use super::{PredictionOutput, Predictor};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// How tree outputs combine into the ensemble prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random forest: average of tree outputs
    Mean,
    /// Gradient boosting: base score plus the sum of tree outputs
    Sum,
}

/// One node of a flattened regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// `x[feature] <= threshold` descends to `left`, otherwise `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a flat node array rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    /// Walk from the root to a leaf.
    pub fn evaluate(&self, features: &[f64]) -> Result<f64, ModelError> {
        let mut idx = 0usize;

        // A well-formed tree reaches a leaf in fewer hops than it has nodes
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let x = features.get(*feature).copied().ok_or(ModelError::FeatureIndex {
                        index: *feature,
                        len: features.len(),
                    })?;
                    idx = if x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::Malformed(format!("node index {idx} out of range")));
                }
            }
        }

        Err(ModelError::Malformed("tree does not terminate in a leaf".to_string()))
    }
}

/// Fitted tree ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub trees: Vec<RegressionTree>,
    pub aggregation: Aggregation,

    /// Added to the aggregated tree output
    #[serde(default)]
    pub base_score: f64,

    /// Expected input width, checked when present
    #[serde(default)]
    pub n_features: Option<usize>,
}

impl TreeEnsemble {
    pub fn new(trees: Vec<RegressionTree>, aggregation: Aggregation) -> Self {
        Self {
            trees,
            aggregation,
            base_score: 0.0,
            n_features: None,
        }
    }
}

impl Predictor for TreeEnsemble {
    fn predict(&self, features: &[f64]) -> Result<PredictionOutput, ModelError> {
        if let Some(expected) = self.n_features {
            if features.len() != expected {
                return Err(ModelError::ShapeMismatch { expected, actual: features.len() });
            }
        }
        if self.trees.is_empty() {
            return Err(ModelError::Malformed("ensemble has no trees".to_string()));
        }

        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(features)?;
        }

        let combined = match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => total,
        };

        Ok(PredictionOutput::Scalar(self.base_score + combined))
    }

    fn name(&self) -> &str {
        match self.aggregation {
            Aggregation::Mean => "random_forest",
            Aggregation::Sum => "gradient_boosting",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single split on feature 0 at `threshold`
    fn stump(threshold: f64, low: f64, high: f64) -> RegressionTree {
        RegressionTree::new(vec![
            TreeNode::Split { feature: 0, threshold, left: 1, right: 2 },
            TreeNode::Leaf { value: low },
            TreeNode::Leaf { value: high },
        ])
    }

    #[test]
    fn test_tree_walk() {
        let tree = stump(0.0, 1.0, 5.0);
        assert_eq!(tree.evaluate(&[-0.5]), Ok(1.0));
        assert_eq!(tree.evaluate(&[0.0]), Ok(1.0));
        assert_eq!(tree.evaluate(&[0.5]), Ok(5.0));
    }

    #[test]
    fn test_forest_averages() {
        let forest =
            TreeEnsemble::new(vec![stump(0.0, 2.0, 4.0), stump(1.0, 3.0, 6.0)], Aggregation::Mean);
        // x = 0.5: first tree goes right (4.0), second goes left (3.0)
        assert_eq!(forest.predict(&[0.5]), Ok(PredictionOutput::Scalar(3.5)));
        assert_eq!(forest.name(), "random_forest");
    }

    #[test]
    fn test_boosting_sums_with_base_score() {
        let mut boosted = TreeEnsemble::new(
            vec![stump(0.0, -0.5, 0.5), stump(0.0, -0.25, 0.25)],
            Aggregation::Sum,
        );
        boosted.base_score = 3.0;
        assert_eq!(boosted.predict(&[1.0]), Ok(PredictionOutput::Scalar(3.75)));
    }

    #[test]
    fn test_malformed_trees() {
        let split = |left, right| TreeNode::Split { feature: 0, threshold: 0.0, left, right };
        let dangling = RegressionTree::new(vec![split(7, 8)]);
        assert!(matches!(dangling.evaluate(&[1.0]), Err(ModelError::Malformed(_))));

        let cycle = RegressionTree::new(vec![split(0, 0)]);
        assert!(matches!(cycle.evaluate(&[1.0]), Err(ModelError::Malformed(_))));

        let wide = stump(0.0, 1.0, 2.0);
        let narrow = RegressionTree::new(vec![
            TreeNode::Split { feature: 3, threshold: 0.0, left: 1, right: 2 },
            TreeNode::Leaf { value: 0.0 },
            TreeNode::Leaf { value: 1.0 },
        ]);
        assert!(wide.evaluate(&[0.0]).is_ok());
        assert_eq!(narrow.evaluate(&[0.0]), Err(ModelError::FeatureIndex { index: 3, len: 1 }));
    }

    #[test]
    fn test_width_check_and_empty() {
        let mut forest = TreeEnsemble::new(vec![stump(0.0, 1.0, 2.0)], Aggregation::Mean);
        forest.n_features = Some(2);
        assert_eq!(
            forest.predict(&[0.0]),
            Err(ModelError::ShapeMismatch { expected: 2, actual: 1 })
        );

        let empty = TreeEnsemble::new(Vec::new(), Aggregation::Sum);
        assert!(matches!(empty.predict(&[0.0]), Err(ModelError::Malformed(_))));
    }
}
