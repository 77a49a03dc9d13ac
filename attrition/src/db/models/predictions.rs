//! Database models for persisted predictions.

use crate::inference::{RiskLevel, Scored};
use crate::types::{EmployeeId, PredictionId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct PredictionCreateDBRequest {
    /// Soft reference; no referential integrity is enforced
    pub employee_id: Option<EmployeeId>,
    pub model_version: String,
    /// "Yes" or "No"
    pub prediction: String,
    pub probability: f64,
    pub risk_level: RiskLevel,
}

impl PredictionCreateDBRequest {
    pub fn from_scored(employee_id: Option<EmployeeId>, model_version: &str, scored: &Scored) -> Self {
        Self {
            employee_id,
            model_version: model_version.to_string(),
            prediction: scored.attrition_label().to_string(),
            probability: scored.probability,
            risk_level: scored.risk_level,
        }
    }
}

/// Only the feedback of a stored prediction is mutable.
#[derive(Debug, Clone, Default)]
pub struct PredictionUpdateDBRequest {
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PredictionDBResponse {
    pub id: PredictionId,
    pub employee_id: Option<EmployeeId>,
    pub model_version: String,
    pub prediction: String,
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}
