//! API request/response models for employee records.

use super::pagination::Pagination;
use crate::db::models::employees::EmployeeDBResponse;
use crate::inference::{RawRecord, RawValue};
use crate::types::EmployeeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Every stored employee attribute except `age`, which is required on create.
///
/// Field names are the raw snake_case names used throughout the API and match the table
/// columns one to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EmployeeAttributes {
    /// Observed outcome, "Yes" or "No"
    pub attrition: Option<String>,
    pub business_travel: Option<String>,
    pub daily_rate: Option<i64>,
    pub department: Option<String>,
    pub distance_from_home: Option<i64>,
    pub education: Option<i64>,
    pub education_field: Option<String>,
    pub employee_count: Option<i64>,
    pub employee_number: Option<i64>,
    pub environment_satisfaction: Option<i64>,
    pub gender: Option<String>,
    pub hourly_rate: Option<i64>,
    pub job_involvement: Option<i64>,
    pub job_level: Option<i64>,
    pub job_role: Option<String>,
    pub job_satisfaction: Option<i64>,
    pub marital_status: Option<String>,
    pub monthly_income: Option<f64>,
    pub monthly_rate: Option<i64>,
    pub num_companies_worked: Option<i64>,
    pub over_18: Option<String>,
    pub over_time: Option<String>,
    pub percent_salary_hike: Option<i64>,
    pub performance_rating: Option<i64>,
    pub relationship_satisfaction: Option<i64>,
    pub standard_hours: Option<i64>,
    pub stock_option_level: Option<i64>,
    pub total_working_years: Option<i64>,
    pub training_times_last_year: Option<i64>,
    pub work_life_balance: Option<i64>,
    pub years_at_company: Option<i64>,
    pub years_in_current_role: Option<i64>,
    pub years_since_last_promotion: Option<i64>,
    pub years_with_curr_manager: Option<i64>,
}

/// A single attribute value as bound into SQL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue<'a> {
    Text(Option<&'a str>),
    Integer(Option<i64>),
    Real(Option<f64>),
}

/// Number of attribute columns besides `age`.
pub const ATTRIBUTE_COUNT: usize = 34;

/// Names of the text-typed attribute columns.
pub const TEXT_ATTRIBUTES: [&str; 9] = [
    "attrition",
    "business_travel",
    "department",
    "education_field",
    "gender",
    "job_role",
    "marital_status",
    "over_18",
    "over_time",
];

impl EmployeeAttributes {
    /// Column name and value pairs, in table column order.
    pub fn columns(&self) -> [(&'static str, AttributeValue<'_>); ATTRIBUTE_COUNT] {
        use AttributeValue::{Integer, Real, Text};
        [
            ("attrition", Text(self.attrition.as_deref())),
            ("business_travel", Text(self.business_travel.as_deref())),
            ("daily_rate", Integer(self.daily_rate)),
            ("department", Text(self.department.as_deref())),
            ("distance_from_home", Integer(self.distance_from_home)),
            ("education", Integer(self.education)),
            ("education_field", Text(self.education_field.as_deref())),
            ("employee_count", Integer(self.employee_count)),
            ("employee_number", Integer(self.employee_number)),
            ("environment_satisfaction", Integer(self.environment_satisfaction)),
            ("gender", Text(self.gender.as_deref())),
            ("hourly_rate", Integer(self.hourly_rate)),
            ("job_involvement", Integer(self.job_involvement)),
            ("job_level", Integer(self.job_level)),
            ("job_role", Text(self.job_role.as_deref())),
            ("job_satisfaction", Integer(self.job_satisfaction)),
            ("marital_status", Text(self.marital_status.as_deref())),
            ("monthly_income", Real(self.monthly_income)),
            ("monthly_rate", Integer(self.monthly_rate)),
            ("num_companies_worked", Integer(self.num_companies_worked)),
            ("over_18", Text(self.over_18.as_deref())),
            ("over_time", Text(self.over_time.as_deref())),
            ("percent_salary_hike", Integer(self.percent_salary_hike)),
            ("performance_rating", Integer(self.performance_rating)),
            ("relationship_satisfaction", Integer(self.relationship_satisfaction)),
            ("standard_hours", Integer(self.standard_hours)),
            ("stock_option_level", Integer(self.stock_option_level)),
            ("total_working_years", Integer(self.total_working_years)),
            ("training_times_last_year", Integer(self.training_times_last_year)),
            ("work_life_balance", Integer(self.work_life_balance)),
            ("years_at_company", Integer(self.years_at_company)),
            ("years_in_current_role", Integer(self.years_in_current_role)),
            ("years_since_last_promotion", Integer(self.years_since_last_promotion)),
            ("years_with_curr_manager", Integer(self.years_with_curr_manager)),
        ]
    }

    /// Scoring input for a stored employee. Unset attributes are left out.
    pub fn to_raw_record(&self, age: i64) -> RawRecord {
        let mut record = RawRecord::new();
        record.insert("age".to_string(), RawValue::from(age));
        for (column, value) in self.columns() {
            let value = match value {
                AttributeValue::Text(v) => v.map(RawValue::from),
                AttributeValue::Integer(v) => v.map(RawValue::from),
                AttributeValue::Real(v) => v.map(RawValue::from),
            };
            if let Some(value) = value {
                record.insert(column.to_string(), value);
            }
        }
        record
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeCreate {
    pub age: i64,
    #[serde(flatten)]
    pub attributes: EmployeeAttributes,
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EmployeeUpdate {
    pub age: Option<i64>,
    #[serde(flatten)]
    pub attributes: EmployeeAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    pub id: EmployeeId,
    pub age: i64,
    #[serde(flatten)]
    pub attributes: EmployeeAttributes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmployeeDBResponse> for EmployeeResponse {
    fn from(db: EmployeeDBResponse) -> Self {
        Self {
            id: db.id,
            age: db.age,
            attributes: db.attributes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing employees
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListEmployeesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on department, job role or education field
    pub search: Option<String>,

    /// Exact department match
    pub department: Option<String>,

    /// true for employees who left, false for those who stayed
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub attrition: Option<bool>,
}
