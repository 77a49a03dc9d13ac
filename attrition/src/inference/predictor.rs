//! The classifier seam and the loaded predictor built on top of it.

use super::artifact::{ArtifactError, ModelArtifact, ModelMetrics};
use super::booster::GradientBoostedTrees;
use super::encoder::{EncodeError, FeatureEncoder, RawRecord};
use super::risk::RiskLevel;
use serde::Serialize;
use std::path::Path;

/// Probability at or above which the hard label is "leaves" (1).
pub const DECISION_THRESHOLD: f64 = 0.5;

/// A trained binary classifier over encoded feature vectors.
pub trait Classifier: Send + Sync {
    /// Estimated probability of the positive class (the employee leaves).
    fn predict_proba(&self, features: &[f64]) -> f64;

    /// Hard label, 1 meaning "predicted to leave".
    fn predict(&self, features: &[f64]) -> u8 {
        u8::from(self.predict_proba(features) >= DECISION_THRESHOLD)
    }
}

/// Outcome of scoring one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scored {
    pub label: u8,
    /// Rounded to four decimal places.
    pub probability: f64,
    pub risk_level: RiskLevel,
}

impl Scored {
    /// "Yes"/"No" as stored alongside the dataset's own attrition column.
    pub fn attrition_label(&self) -> &'static str {
        if self.label == 1 { "Yes" } else { "No" }
    }
}

/// A loaded model: its encoding table, classifier and provenance.
pub struct Predictor {
    version: String,
    encoder: FeatureEncoder,
    classifier: Box<dyn Classifier>,
    metrics: Option<ModelMetrics>,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("version", &self.version)
            .field("features", &self.encoder.features().len())
            .finish_non_exhaustive()
    }
}

impl Predictor {
    pub fn new(version: impl Into<String>, encoder: FeatureEncoder, classifier: Box<dyn Classifier>) -> Self {
        Self {
            version: version.into(),
            encoder,
            classifier,
            metrics: None,
        }
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        let classifier = GradientBoostedTrees::from_artifact(&artifact);
        let encoder = FeatureEncoder::new(artifact.features, artifact.categories);
        Self {
            version: artifact.version,
            encoder,
            classifier: Box::new(classifier),
            metrics: artifact.metrics,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        ModelArtifact::from_path(path).map(Self::from_artifact)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn metrics(&self) -> Option<&ModelMetrics> {
        self.metrics.as_ref()
    }

    /// Label and probability for an already encoded feature vector. The probability is rounded
    /// to four decimals and the label is taken from that rounded value.
    pub fn predict(&self, features: &[f64]) -> (u8, f64) {
        let probability = round4(self.classifier.predict_proba(features).clamp(0.0, 1.0));
        (u8::from(probability >= DECISION_THRESHOLD), probability)
    }

    /// Encode, predict and band one raw record.
    pub fn score(&self, record: &RawRecord) -> Result<Scored, EncodeError> {
        let features = self.encoder.encode(record)?;
        let (label, probability) = self.predict(&features);
        Ok(Scored {
            label,
            probability,
            risk_level: RiskLevel::from_probability(probability),
        })
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
