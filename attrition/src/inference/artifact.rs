//! On-disk model artifact produced by the offline training pipeline.
//!
//! The artifact is a JSON document holding a gradient-boosted tree ensemble together with
//! the categorical encoding table the trees were fit against:
//!
//! ```json
//! {
//!   "version": "xgb-2025.03",
//!   "features": ["Age", "Department", "MonthlyIncome", "OverTime"],
//!   "categories": { "Department": ["Human Resources", "Research & Development", "Sales"] },
//!   "base_score": -1.2,
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 3, "threshold": 0.5, "left": 1, "right": 2 },
//!         { "leaf": -0.4 },
//!         { "leaf": 0.9 }
//!     ] }
//!   ],
//!   "metrics": { "accuracy": 0.87, "f1": 0.52 }
//! }
//! ```
//!
//! Node `0` is each tree's root. A split sends a row left when `value < threshold`, and
//! missing values (`NaN`) follow `default_left`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Held-out evaluation numbers recorded by the training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelMetrics {
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    pub training_rows: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_left")]
        default_left: bool,
    },
    Leaf {
        leaf: f64,
    },
}

fn default_left() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    pub features: Vec<String>,
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    /// Initial margin (log-odds) added before the tree outputs.
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
    #[serde(default)]
    pub metrics: Option<ModelMetrics>,
}

impl ModelArtifact {
    /// Read, parse and validate an artifact file.
    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_str(contents)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Structural checks that make tree evaluation total: every child index points forward
    /// and in bounds, so walking a tree always reaches a leaf.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.features.is_empty() {
            return Err(ArtifactError::Invalid("feature list is empty".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("ensemble has no trees".to_string()));
        }
        for feature in self.categories.keys() {
            if !self.features.contains(feature) {
                return Err(ArtifactError::Invalid(format!(
                    "categorical column '{feature}' is not a model feature"
                )));
            }
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ArtifactError::Invalid(format!("tree {t} has no nodes")));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                if let Node::Split {
                    feature, left, right, threshold, ..
                } = node
                {
                    if *feature >= self.features.len() {
                        return Err(ArtifactError::Invalid(format!(
                            "tree {t} node {i} splits on feature index {feature}, model has {} features",
                            self.features.len()
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(ArtifactError::Invalid(format!("tree {t} node {i} has a NaN threshold")));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= tree.nodes.len() {
                            return Err(ArtifactError::Invalid(format!(
                                "tree {t} node {i} has out of order child {child}"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
