//! Database repository for employee records.

use crate::api::models::employees::{AttributeValue, EmployeeAttributes};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::employees::{EmployeeCreateDBRequest, EmployeeDBResponse, EmployeeUpdateDBRequest},
};
use crate::types::EmployeeId;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, query_builder::Separated};
use tracing::instrument;

/// Filter for listing employees
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub skip: i64,
    pub limit: i64,
    /// Case-insensitive substring of department, job role or education field
    pub search: Option<String>,
    pub department: Option<String>,
    /// Some(true) keeps leavers ("Yes"), Some(false) keeps stayers ("No")
    pub attrition: Option<bool>,
}

impl EmployeeFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_department(mut self, department: Option<String>) -> Self {
        self.department = department;
        self
    }

    pub fn with_attrition(mut self, attrition: Option<bool>) -> Self {
        self.attrition = attrition;
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", search.trim().to_lowercase());
            query.push(" AND (LOWER(COALESCE(department, '')) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(COALESCE(job_role, '')) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(COALESCE(education_field, '')) LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        if let Some(department) = &self.department {
            query.push(" AND department = ");
            query.push_bind(department.clone());
        }

        if let Some(attrition) = self.attrition {
            query.push(" AND attrition = ");
            query.push_bind(if attrition { "Yes" } else { "No" });
        }
    }
}

fn push_attribute<'args>(separated: &mut Separated<'_, 'args, Sqlite, &'static str>, value: AttributeValue<'_>) {
    match value {
        AttributeValue::Text(v) => separated.push_bind(v.map(str::to_string)),
        AttributeValue::Integer(v) => separated.push_bind(v),
        AttributeValue::Real(v) => separated.push_bind(v),
    };
}

fn insert_query(age: i64, attributes: &EmployeeAttributes) -> QueryBuilder<'static, Sqlite> {
    let columns = attributes.columns();
    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();

    let mut query = QueryBuilder::new("INSERT INTO employees (age, ");
    query.push(names.join(", "));
    query.push(", created_at, updated_at) VALUES (");

    let now = Utc::now();
    let mut values = query.separated(", ");
    values.push_bind(age);
    for (_, value) in columns {
        push_attribute(&mut values, value);
    }
    values.push_bind(now);
    values.push_bind(now);
    values.push_unseparated(") RETURNING *");

    query
}

pub struct Employees<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Employees<'c> {
    type CreateRequest = EmployeeCreateDBRequest;
    type UpdateRequest = EmployeeUpdateDBRequest;
    type Response = EmployeeDBResponse;
    type Id = EmployeeId;
    type Filter = EmployeeFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let employee = insert_query(request.age, &request.attributes)
            .build_query_as::<EmployeeDBResponse>()
            .fetch_one(&mut *self.db)
            .await?;

        Ok(employee)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let employee = sqlx::query_as::<_, EmployeeDBResponse>("SELECT * FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(employee)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM employees WHERE 1=1");
        filter.push_conditions(&mut query);

        query.push(" ORDER BY id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let employees = query.build_query_as::<EmployeeDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(employees)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut query = QueryBuilder::new("UPDATE employees SET age = COALESCE(");
        query.push_bind(request.age);
        query.push(", age)");

        for (column, value) in request.attributes.columns() {
            query.push(format!(", {column} = COALESCE("));
            match value {
                AttributeValue::Text(v) => query.push_bind(v.map(str::to_string)),
                AttributeValue::Integer(v) => query.push_bind(v),
                AttributeValue::Real(v) => query.push_bind(v),
            };
            query.push(format!(", {column})"));
        }

        query.push(", updated_at = ");
        query.push_bind(Utc::now());
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" RETURNING *");

        let employee = query
            .build_query_as::<EmployeeDBResponse>()
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(employee)
    }
}

impl<'c> Employees<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Number of employees matching the filter, ignoring pagination
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &EmployeeFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM employees WHERE 1=1");
        filter.push_conditions(&mut query);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    /// Insert many records, used by the startup import. Run inside a transaction so a bad
    /// row rolls back the whole import.
    #[instrument(skip(self, requests), fields(count = requests.len()), err)]
    pub async fn create_many(&mut self, requests: &[EmployeeCreateDBRequest]) -> Result<u64> {
        let mut inserted = 0;
        for request in requests {
            let result = insert_query(request.age, &request.attributes)
                .build()
                .execute(&mut *self.db)
                .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }
}
