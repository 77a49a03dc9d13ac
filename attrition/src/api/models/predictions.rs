//! API request/response models for scoring and prediction history.

use super::pagination::Pagination;
use crate::db::models::predictions::PredictionDBResponse;
use crate::inference::{ModelMetrics, RawRecord, RawValue, RiskLevel, Scored};
use crate::types::{EmployeeId, PredictionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

/// Single-record scoring input. Every field is optional; omitted features encode as 0.
///
/// Attributes take a number or a string. Numeric attributes given as text are parsed, and
/// categorical attributes given as a number are taken as an already-encoded code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PredictionInput {
    /// Stored employee this prediction is about, recorded with the persisted outcome
    pub employee_id: Option<EmployeeId>,
    pub age: Option<RawValue>,
    pub business_travel: Option<RawValue>,
    pub daily_rate: Option<RawValue>,
    pub department: Option<RawValue>,
    pub distance_from_home: Option<RawValue>,
    pub education: Option<RawValue>,
    pub education_field: Option<RawValue>,
    pub environment_satisfaction: Option<RawValue>,
    pub gender: Option<RawValue>,
    pub hourly_rate: Option<RawValue>,
    pub job_involvement: Option<RawValue>,
    pub job_level: Option<RawValue>,
    pub job_role: Option<RawValue>,
    pub job_satisfaction: Option<RawValue>,
    pub marital_status: Option<RawValue>,
    pub monthly_income: Option<RawValue>,
    pub monthly_rate: Option<RawValue>,
    pub num_companies_worked: Option<RawValue>,
    pub over_time: Option<RawValue>,
    pub percent_salary_hike: Option<RawValue>,
    pub performance_rating: Option<RawValue>,
    pub relationship_satisfaction: Option<RawValue>,
    pub stock_option_level: Option<RawValue>,
    pub total_working_years: Option<RawValue>,
    pub training_times_last_year: Option<RawValue>,
    pub work_life_balance: Option<RawValue>,
    pub years_at_company: Option<RawValue>,
    pub years_in_current_role: Option<RawValue>,
    pub years_since_last_promotion: Option<RawValue>,
    pub years_with_curr_manager: Option<RawValue>,
}

impl PredictionInput {
    pub fn to_raw_record(&self) -> RawRecord {
        let attributes = [
            ("age", &self.age),
            ("business_travel", &self.business_travel),
            ("daily_rate", &self.daily_rate),
            ("department", &self.department),
            ("distance_from_home", &self.distance_from_home),
            ("education", &self.education),
            ("education_field", &self.education_field),
            ("environment_satisfaction", &self.environment_satisfaction),
            ("gender", &self.gender),
            ("hourly_rate", &self.hourly_rate),
            ("job_involvement", &self.job_involvement),
            ("job_level", &self.job_level),
            ("job_role", &self.job_role),
            ("job_satisfaction", &self.job_satisfaction),
            ("marital_status", &self.marital_status),
            ("monthly_income", &self.monthly_income),
            ("monthly_rate", &self.monthly_rate),
            ("num_companies_worked", &self.num_companies_worked),
            ("over_time", &self.over_time),
            ("percent_salary_hike", &self.percent_salary_hike),
            ("performance_rating", &self.performance_rating),
            ("relationship_satisfaction", &self.relationship_satisfaction),
            ("stock_option_level", &self.stock_option_level),
            ("total_working_years", &self.total_working_years),
            ("training_times_last_year", &self.training_times_last_year),
            ("work_life_balance", &self.work_life_balance),
            ("years_at_company", &self.years_at_company),
            ("years_in_current_role", &self.years_in_current_role),
            ("years_since_last_promotion", &self.years_since_last_promotion),
            ("years_with_curr_manager", &self.years_with_curr_manager),
        ];

        attributes
            .into_iter()
            .filter_map(|(name, value)| value.clone().map(|v| (name.to_string(), v)))
            .collect()
    }
}

/// Outcome of scoring one record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    /// 1 when the employee is predicted to leave
    pub prediction: u8,
    /// Probability of leaving, rounded to four decimals
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub model_version: String,
    /// Human readable one-liner, e.g. "High attrition risk (82.0% probability of leaving)."
    pub summary: String,
}

impl PredictionResponse {
    pub fn new(scored: &Scored, model_version: &str) -> Self {
        Self {
            prediction: scored.label,
            probability: scored.probability,
            risk_level: scored.risk_level,
            model_version: model_version.to_string(),
            summary: scored.risk_level.summary(scored.probability),
        }
    }
}

/// Multipart body for batch scoring
#[derive(Debug, ToSchema)]
pub struct BatchUpload {
    /// Comma-separated file with a header row of raw field names
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Batch scoring result. Rows keep their upload order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchPredictionResponse {
    /// Number of data rows in the upload, failed rows included
    pub total: usize,
    /// Rows that could not be scored; these carry an `error` field and null predictions
    pub failed: usize,
    /// Original cells plus `prediction`, `probability` and `riskLevel`
    #[schema(value_type = Vec<Object>)]
    pub predictions: Vec<Map<String, Value>>,
}

/// A persisted prediction
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecordResponse {
    pub id: PredictionId,
    pub employee_id: Option<EmployeeId>,
    pub model_version: String,
    /// "Yes" or "No"
    pub prediction: String,
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PredictionDBResponse> for PredictionRecordResponse {
    fn from(db: PredictionDBResponse) -> Self {
        Self {
            id: db.id,
            employee_id: db.employee_id,
            model_version: db.model_version,
            prediction: db.prediction,
            probability: db.probability,
            risk_level: db.risk_level,
            feedback: db.feedback,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListPredictionsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// Reviewer feedback on a stored prediction; null clears it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedbackUpdate {
    pub feedback: Option<String>,
}

/// One model input, in the order the model consumes them
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureInfo {
    /// Feature name as used by the model, e.g. `MonthlyIncome`
    pub name: String,
    /// Field name accepted by the API, e.g. `monthly_income`
    pub raw_name: Option<String>,
    pub categorical: bool,
}

/// Raw field name to label to code
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct EncodersResponse(pub BTreeMap<String, BTreeMap<String, i64>>);

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfoResponse {
    pub loaded: bool,
    pub version: Option<String>,
    pub feature_count: usize,
    pub metrics: Option<ModelMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_to_raw_record_keeps_set_fields() {
        let input: PredictionInput = serde_json::from_value(serde_json::json!({
            "age": 30,
            "department": "IT",
            "job_role": "Software Engineer",
            "monthly_income": 50000,
            "over_time": "No"
        }))
        .unwrap();

        let record = input.to_raw_record();
        assert_eq!(record.len(), 5);
        assert_eq!(record["age"], RawValue::Number(30.0));
        assert_eq!(record["over_time"], RawValue::Text("No".to_string()));
    }

    #[test]
    fn test_input_accepts_numbers_and_text_for_any_attribute() {
        let input: PredictionInput = serde_json::from_value(serde_json::json!({
            "employee_id": 4,
            "age": "41",
            "department": 2
        }))
        .unwrap();

        assert_eq!(input.employee_id, Some(4));
        let record = input.to_raw_record();
        assert_eq!(record["age"], RawValue::Text("41".to_string()));
        assert_eq!(record["department"], RawValue::Number(2.0));
        assert!(!record.contains_key("employee_id"));
    }

    #[test]
    fn test_response_uses_camel_case() {
        let scored = Scored {
            label: 1,
            probability: 0.82,
            risk_level: RiskLevel::High,
        };
        let json = serde_json::to_value(PredictionResponse::new(&scored, "v1")).unwrap();

        assert_eq!(json["prediction"], 1);
        assert_eq!(json["probability"], 0.82);
        assert_eq!(json["riskLevel"], "High");
        assert_eq!(json["modelVersion"], "v1");
        assert_eq!(json["summary"], "High attrition risk (82.0% probability of leaving).");
    }
}
