//! Aggregate workforce statistics over the employee table and stored predictions.

use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        analytics::{DashboardStats, DepartmentStats, RiskDistribution, RoleStats, SalaryRangeStats},
        users::CurrentUser,
    },
    db::handlers::Analytics,
    errors::{Error, Result},
};

#[utoipa::path(
    get,
    path = "/api/analytics/dashboard",
    tag = "analytics",
    summary = "Headline workforce numbers",
    responses(
        (status = 200, description = "Dashboard statistics; all zero when there are no employees", body = DashboardStats),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn dashboard(State(state): State<AppState>, _current_user: CurrentUser) -> Result<Json<DashboardStats>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Ok(Json(Analytics::new(&mut conn).dashboard().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/department",
    tag = "analytics",
    summary = "Attrition by department",
    responses(
        (status = 200, description = "One entry per department, in order of first appearance", body = Vec<DepartmentStats>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn by_department(State(state): State<AppState>, _current_user: CurrentUser) -> Result<Json<Vec<DepartmentStats>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Ok(Json(Analytics::new(&mut conn).by_department().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/salary",
    tag = "analytics",
    summary = "Attrition by monthly income band",
    description = "Always returns the five bands 0-30k, 30k-60k, 60k-90k, 90k-120k and 120k+, including empty ones",
    responses(
        (status = 200, description = "Salary bands", body = Vec<SalaryRangeStats>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn by_salary(State(state): State<AppState>, _current_user: CurrentUser) -> Result<Json<Vec<SalaryRangeStats>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Ok(Json(Analytics::new(&mut conn).by_salary().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/role",
    tag = "analytics",
    summary = "Attrition by job role",
    responses(
        (status = 200, description = "Roles, largest first", body = Vec<RoleStats>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn by_role(State(state): State<AppState>, _current_user: CurrentUser) -> Result<Json<Vec<RoleStats>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Ok(Json(Analytics::new(&mut conn).by_role().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/risk",
    tag = "analytics",
    summary = "Stored predictions per risk band",
    responses(
        (status = 200, description = "Counts for Low, Medium and High", body = Vec<RiskDistribution>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn risk_distribution(State(state): State<AppState>, _current_user: CurrentUser) -> Result<Json<Vec<RiskDistribution>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Ok(Json(Analytics::new(&mut conn).risk_distribution().await?))
}
