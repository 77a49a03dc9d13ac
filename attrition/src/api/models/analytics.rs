//! Response models for the analytics endpoints. All keys are camelCase.

use crate::inference::RiskLevel;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Headline workforce numbers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_employees: i64,
    /// Percentage of employees with attrition "Yes", two decimals
    pub attrition_rate: f64,
    /// One decimal
    pub average_age: f64,
    /// Mean monthly income, two decimals
    pub average_salary: f64,
    /// Mean job satisfaction score, two decimals
    pub job_satisfaction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStats {
    /// "Unknown" when the record has no department
    pub department: String,
    pub total: i64,
    pub attrition: i64,
    pub attrition_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRangeStats {
    /// Bucket label, e.g. "30k-60k"
    pub range: String,
    pub total: i64,
    pub attrition: i64,
    pub attrition_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleStats {
    pub role: String,
    pub total: i64,
    pub attrition: i64,
    pub attrition_rate: f64,
}

/// Persisted predictions per risk band
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskDistribution {
    pub risk_level: RiskLevel,
    pub count: i64,
}
