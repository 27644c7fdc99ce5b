// Fitted regression models
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, ModelError};
use crate::models::artifact::Artifact;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Rows with `x[feature] <= threshold` continue at `left`, the rest at `right`.
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

/// A regression tree stored as a flat node array rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => index = if x[*feature] <= *threshold { *left } else { *right },
            }
        }
    }

    // Children must point strictly forward, which rules out cycles.
    fn check(&self, tree: usize, n_features: usize) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::invalid(format!("tree {tree} has no nodes")));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(ArtifactError::invalid(format!(
                            "tree {tree} node {i} splits on feature {feature} of {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ArtifactError::invalid(format!(
                            "tree {tree} node {i} has a non-finite threshold"
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(ArtifactError::invalid(format!(
                                "tree {tree} node {i} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ArtifactError::invalid(format!(
                            "tree {tree} node {i} has a non-finite leaf value"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Estimator {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    GradientBoosting {
        init: f64,
        learning_rate: f64,
        trees: Vec<RegressionTree>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    pub n_features: usize,
    pub estimator: Estimator,
}

impl RegressionModel {
    pub fn new(n_features: usize, estimator: Estimator) -> Result<Self, ArtifactError> {
        let model = Self {
            n_features,
            estimator,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        match self.estimator {
            Estimator::Linear { .. } => "linear",
            Estimator::GradientBoosting { .. } => "gradient boosting",
        }
    }

    pub fn predict_row(&self, x: &[f64]) -> Result<f64, ModelError> {
        if x.len() != self.n_features {
            return Err(ModelError::WidthMismatch {
                expected: self.n_features,
                found: x.len(),
            });
        }
        let y = match &self.estimator {
            Estimator::Linear {
                coefficients,
                intercept,
            } => intercept + coefficients.iter().zip(x).map(|(w, v)| w * v).sum::<f64>(),
            Estimator::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => init + learning_rate * trees.iter().map(|t| t.evaluate(x)).sum::<f64>(),
        };
        if !y.is_finite() {
            return Err(ModelError::NonFinite(y));
        }
        Ok(y)
    }

    /// One prediction per input row.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        rows.iter().map(|x| self.predict_row(x)).collect()
    }
}

impl Artifact for RegressionModel {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.n_features == 0 {
            return Err(ArtifactError::invalid("model expects zero features"));
        }
        match &self.estimator {
            Estimator::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != self.n_features {
                    return Err(ArtifactError::invalid(format!(
                        "linear model has {} coefficients for {} features",
                        coefficients.len(),
                        self.n_features
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|w| !w.is_finite()) {
                    return Err(ArtifactError::invalid(
                        "linear model parameters must be finite",
                    ));
                }
            }
            Estimator::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => {
                if !init.is_finite() || !learning_rate.is_finite() {
                    return Err(ArtifactError::invalid(
                        "boosting init and learning rate must be finite",
                    ));
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.check(i, self.n_features)?;
                }
            }
        }
        Ok(())
    }
}
