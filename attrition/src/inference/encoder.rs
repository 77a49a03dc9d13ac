//! Feature encoding: raw employee attributes to the model's numeric feature vector.
//!
//! Raw inputs (API payloads, CSV uploads, stored employees) name attributes in snake_case,
//! while the trained model was fit on the dataset's PascalCase column names. The encoder:
//!
//! 1. renames every known raw field through [`FEATURE_NAMES`] (unknown fields are dropped),
//! 2. substitutes categorical labels with the integer codes the model was trained on,
//! 3. lays the values out in the model's declared feature order, filling gaps with `0`.
//!
//! Categorical codes are indices into the sorted class list that training produced, so a
//! valid code is always `0..n`. Labels never seen during training encode to
//! [`UNSEEN_CATEGORY`], which cannot collide with a trained code.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, trace};
use utoipa::ToSchema;

/// Code substituted for a categorical label that is not in the trained class list.
pub const UNSEEN_CATEGORY: f64 = -1.0;

/// Value used for any model feature absent from the input.
pub const MISSING_FEATURE: f64 = 0.0;

/// Raw field name to model feature name, in the dataset's column order.
pub const FEATURE_NAMES: [(&str, &str); 30] = [
    ("age", "Age"),
    ("business_travel", "BusinessTravel"),
    ("daily_rate", "DailyRate"),
    ("department", "Department"),
    ("distance_from_home", "DistanceFromHome"),
    ("education", "Education"),
    ("education_field", "EducationField"),
    ("environment_satisfaction", "EnvironmentSatisfaction"),
    ("gender", "Gender"),
    ("hourly_rate", "HourlyRate"),
    ("job_involvement", "JobInvolvement"),
    ("job_level", "JobLevel"),
    ("job_role", "JobRole"),
    ("job_satisfaction", "JobSatisfaction"),
    ("marital_status", "MaritalStatus"),
    ("monthly_income", "MonthlyIncome"),
    ("monthly_rate", "MonthlyRate"),
    ("num_companies_worked", "NumCompaniesWorked"),
    ("over_time", "OverTime"),
    ("percent_salary_hike", "PercentSalaryHike"),
    ("performance_rating", "PerformanceRating"),
    ("relationship_satisfaction", "RelationshipSatisfaction"),
    ("stock_option_level", "StockOptionLevel"),
    ("total_working_years", "TotalWorkingYears"),
    ("training_times_last_year", "TrainingTimesLastYear"),
    ("work_life_balance", "WorkLifeBalance"),
    ("years_at_company", "YearsAtCompany"),
    ("years_in_current_role", "YearsInCurrentRole"),
    ("years_since_last_promotion", "YearsSinceLastPromotion"),
    ("years_with_curr_manager", "YearsWithCurrManager"),
];

/// Model feature name for a raw field name.
pub fn model_name(raw: &str) -> Option<&'static str> {
    FEATURE_NAMES.iter().find(|(r, _)| *r == raw).map(|(_, m)| *m)
}

/// Raw field name for a model feature name.
pub fn raw_name(model: &str) -> Option<&'static str> {
    FEATURE_NAMES.iter().find(|(_, m)| *m == model).map(|(r, _)| *r)
}

/// A single raw attribute value, as it arrives from JSON, CSV or the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// Named raw attributes for one employee.
pub type RawRecord = BTreeMap<String, RawValue>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("feature '{field}' expects a number, got '{value}'")]
    InvalidNumber { field: String, value: String },
}

/// Encodes raw records into the model's fixed-order feature vector.
///
/// Built once from the loaded artifact and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    features: Vec<String>,
    categories: BTreeMap<String, Vec<String>>,
    codes: HashMap<String, HashMap<String, usize>>,
}

impl FeatureEncoder {
    /// `features` is the model's declared order; `categories` maps each categorical model
    /// feature to its sorted trained class list.
    pub fn new(features: Vec<String>, categories: BTreeMap<String, Vec<String>>) -> Self {
        let codes = categories
            .iter()
            .map(|(feature, classes)| {
                let lookup = classes.iter().enumerate().map(|(code, label)| (label.clone(), code)).collect();
                (feature.clone(), lookup)
            })
            .collect();

        Self {
            features,
            categories,
            codes,
        }
    }

    /// Model feature names in the order the classifier consumes them.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn categories(&self) -> &BTreeMap<String, Vec<String>> {
        &self.categories
    }

    pub fn is_categorical(&self, feature: &str) -> bool {
        self.codes.contains_key(feature)
    }

    /// Trained code of a categorical label, or `None` if the label was never seen.
    pub fn category_code(&self, feature: &str, label: &str) -> Option<usize> {
        self.codes.get(feature)?.get(label.trim()).copied()
    }

    /// Encode a raw record into a feature vector of exactly `self.features().len()` values.
    pub fn encode(&self, raw: &RawRecord) -> Result<Vec<f64>, EncodeError> {
        let mut renamed: HashMap<&str, &RawValue> = HashMap::with_capacity(raw.len());
        for (field, value) in raw {
            if matches!(value, RawValue::Text(text) if text.trim().is_empty()) {
                continue;
            }
            match model_name(field) {
                Some(model) => {
                    renamed.insert(model, value);
                }
                // Headers exported straight from the training dataset already use model names
                None if self.features.iter().any(|f| f == field) => {
                    renamed.insert(field.as_str(), value);
                }
                None => trace!(field = %field, "dropping field unknown to the model"),
            }
        }

        self.features
            .iter()
            .map(|feature| match renamed.get(feature.as_str()) {
                None => Ok(MISSING_FEATURE),
                Some(value) if self.is_categorical(feature) => Ok(self.encode_category(feature, value)),
                Some(RawValue::Number(n)) => Ok(*n),
                Some(RawValue::Text(text)) => text.trim().parse::<f64>().map_err(|_| EncodeError::InvalidNumber {
                    field: raw_name(feature).unwrap_or(feature.as_str()).to_string(),
                    value: text.clone(),
                }),
            })
            .collect()
    }

    fn encode_category(&self, feature: &str, value: &RawValue) -> f64 {
        let classes = self.categories.get(feature).map(Vec::len).unwrap_or(0);
        match value {
            RawValue::Text(label) => match self.category_code(feature, label) {
                Some(code) => code as f64,
                None => {
                    debug!(feature, label = %label, "unseen category label, substituting sentinel");
                    UNSEEN_CATEGORY
                }
            },
            // A number is taken as an already-encoded code
            RawValue::Number(n) if n.fract() == 0.0 && *n >= 0.0 && (*n as usize) < classes => *n,
            RawValue::Number(n) => {
                debug!(feature, code = n, "category code out of range, substituting sentinel");
                UNSEEN_CATEGORY
            }
        }
    }
}
