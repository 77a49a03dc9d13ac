//! Database models for employee records.

use crate::api::models::employees::{EmployeeAttributes, EmployeeCreate, EmployeeUpdate};
use crate::types::EmployeeId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct EmployeeCreateDBRequest {
    pub age: i64,
    pub attributes: EmployeeAttributes,
}

impl From<EmployeeCreate> for EmployeeCreateDBRequest {
    fn from(api: EmployeeCreate) -> Self {
        Self {
            age: api.age,
            attributes: api.attributes,
        }
    }
}

/// Partial update: every `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct EmployeeUpdateDBRequest {
    pub age: Option<i64>,
    pub attributes: EmployeeAttributes,
}

impl From<EmployeeUpdate> for EmployeeUpdateDBRequest {
    fn from(api: EmployeeUpdate) -> Self {
        Self {
            age: api.age,
            attributes: api.attributes,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EmployeeDBResponse {
    pub id: EmployeeId,
    pub age: i64,
    #[sqlx(flatten)]
    pub attributes: EmployeeAttributes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
