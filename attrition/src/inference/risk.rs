//! Risk banding of attrition probabilities.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Probabilities strictly below this are [`RiskLevel::Low`].
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.3;
/// Probabilities at or above this are [`RiskLevel::High`].
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Discretization of a predicted attrition probability.
///
/// Bands are half-open: `[0, 0.3)` is low, `[0.3, 0.7)` medium and `[0.7, 1]` high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if probability >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// One-line human readable summary used in prediction responses.
    pub fn summary(&self, probability: f64) -> String {
        format!("{} attrition risk ({:.1}% probability of leaving).", self, probability * 100.0)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
