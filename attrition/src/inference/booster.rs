//! Native evaluation of a gradient-boosted tree ensemble.

use super::artifact::{ModelArtifact, Node, Tree};
use super::predictor::Classifier;

/// Binary logistic tree ensemble: `p = sigmoid(base_score + Σ leaf)`.
#[derive(Debug, Clone)]
pub struct GradientBoostedTrees {
    base_score: f64,
    trees: Vec<Tree>,
}

impl GradientBoostedTrees {
    /// Takes the trees of an already validated artifact.
    pub fn from_artifact(artifact: &ModelArtifact) -> Self {
        Self {
            base_score: artifact.base_score,
            trees: artifact.trees.clone(),
        }
    }

    /// Raw log-odds before the logistic link.
    pub fn margin(&self, features: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|tree| leaf_value(tree, features)).sum::<f64>()
    }
}

impl Classifier for GradientBoostedTrees {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.margin(features))
    }
}

fn leaf_value(tree: &Tree, features: &[f64]) -> f64 {
    let mut index = 0;
    loop {
        match &tree.nodes[index] {
            Node::Leaf { leaf } => return *leaf,
            Node::Split {
                feature,
                threshold,
                left,
                right,
                default_left,
            } => {
                let value = features.get(*feature).copied().unwrap_or(f64::NAN);
                index = if value.is_nan() {
                    if *default_left { *left } else { *right }
                } else if value < *threshold {
                    *left
                } else {
                    *right
                };
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
