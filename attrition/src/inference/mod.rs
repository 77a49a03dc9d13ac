//! Attrition scoring.
//!
//! The serving path for a record is:
//!
//! ```text
//! raw record ─▶ FeatureEncoder ─▶ Classifier ─▶ RiskLevel ─▶ response / persistence
//! ```
//!
//! - [`encoder`]: renames raw fields and encodes categorical labels into the model's
//!   fixed-order feature vector
//! - [`artifact`]: the JSON model artifact written by the training pipeline
//! - [`booster`]: native evaluation of the artifact's tree ensemble
//! - [`predictor`]: the [`Classifier`] seam plus the loaded [`Predictor`]
//! - [`risk`]: probability to risk band mapping
//! - [`batch`]: CSV parsing for batch uploads
//! - [`service`]: the immutable [`PredictionService`] shared through application state

pub mod artifact;
pub mod batch;
pub mod booster;
pub mod encoder;
pub mod predictor;
pub mod risk;
pub mod service;

pub use artifact::{ArtifactError, ModelArtifact, ModelMetrics};
pub use encoder::{EncodeError, FeatureEncoder, RawRecord, RawValue};
pub use predictor::{Classifier, Predictor, Scored};
pub use risk::RiskLevel;
pub use service::PredictionService;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    /// No artifact was loaded at startup
    #[error("model artifact is not loaded")]
    ModelUnavailable,

    /// Upload could not be read as tabular rows
    #[error("malformed batch input: {0}")]
    MalformedBatch(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
