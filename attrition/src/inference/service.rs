//! Prediction service: the immutable handle request handlers score through.

use super::InferenceError;
use super::batch::{BatchOutcome, BatchRow};
use super::encoder::RawRecord;
use super::predictor::{Predictor, Scored};
use crate::config::ModelConfig;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Shared, read-only access to the loaded model.
///
/// Constructed once at startup. When no artifact could be loaded the service is
/// "unavailable" and every scoring call returns [`InferenceError::ModelUnavailable`]; the
/// rest of the API keeps serving.
#[derive(Debug, Clone, Default)]
pub struct PredictionService {
    predictor: Option<Arc<Predictor>>,
}

impl PredictionService {
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor: Some(Arc::new(predictor)),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Load the configured artifact.
    ///
    /// A missing or broken artifact degrades to an unavailable service, unless the
    /// configuration marks the model as required.
    #[instrument(skip_all)]
    pub fn from_config(config: &ModelConfig) -> Result<Self, InferenceError> {
        let Some(path) = config.artifact_path.as_deref() else {
            if config.required {
                return Err(InferenceError::ModelUnavailable);
            }
            warn!("No model artifact configured, predictions are disabled");
            return Ok(Self::unavailable());
        };

        match Predictor::load(path) {
            Ok(predictor) => {
                info!(
                    version = predictor.version(),
                    features = predictor.encoder().features().len(),
                    "Loaded model artifact from {}",
                    path.display()
                );
                Ok(Self::new(predictor))
            }
            Err(e) if config.required => Err(e.into()),
            Err(e) => {
                warn!("Model artifact unavailable, predictions are disabled: {e}");
                Ok(Self::unavailable())
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.predictor.is_some()
    }

    pub fn predictor(&self) -> Result<&Predictor, InferenceError> {
        self.predictor.as_deref().ok_or(InferenceError::ModelUnavailable)
    }

    /// Score a single record.
    pub fn predict_one(&self, record: &RawRecord) -> Result<Scored, InferenceError> {
        let scored = self.predictor()?.score(record)?;
        record_prediction(&scored);
        Ok(scored)
    }

    /// Score every row independently, keeping input order.
    ///
    /// A row that cannot be encoded is returned with its error in place; it never affects
    /// its siblings. CPU bound, so async callers should run it on a blocking thread.
    pub fn predict_batch(&self, rows: Vec<BatchRow>) -> Result<Vec<BatchOutcome>, InferenceError> {
        let predictor = self.predictor()?;

        let outcomes: Vec<BatchOutcome> = rows
            .into_iter()
            .map(|row| {
                let result = predictor.score(&row.to_raw_record());
                match &result {
                    Ok(scored) => record_prediction(scored),
                    Err(e) => debug!("Batch row failed to encode: {e}"),
                }
                BatchOutcome { row, result }
            })
            .collect();

        debug!(
            rows = outcomes.len(),
            failed = outcomes.iter().filter(|o| o.result.is_err()).count(),
            "Scored batch"
        );
        Ok(outcomes)
    }
}

fn record_prediction(scored: &Scored) {
    metrics::counter!("attrition_predictions_total", "risk_level" => scored.risk_level.as_str()).increment(1);
}
