use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        employees::{EmployeeCreate, EmployeeResponse, EmployeeUpdate, ListEmployeesQuery},
        pagination::PaginatedResponse,
        predictions::PredictionResponse,
        users::CurrentUser,
    },
    auth::current_user::require_admin,
    db::{
        handlers::{Employees, Predictions, Repository, employees::EmployeeFilter},
        models::{
            employees::{EmployeeCreateDBRequest, EmployeeUpdateDBRequest},
            predictions::PredictionCreateDBRequest,
        },
    },
    errors::{Error, Result},
    types::EmployeeId,
};

fn employee_not_found(id: EmployeeId) -> Error {
    Error::NotFound {
        resource: "Employee".to_string(),
        id: id.to_string(),
    }
}

fn validate_age(age: i64) -> Result<()> {
    if age < 0 {
        return Err(Error::BadRequest {
            message: "age must not be negative".to_string(),
        });
    }
    Ok(())
}

fn validate_attrition(attrition: Option<&str>) -> Result<()> {
    match attrition {
        None | Some("Yes") | Some("No") => Ok(()),
        Some(other) => Err(Error::BadRequest {
            message: format!("attrition must be \"Yes\" or \"No\", got \"{other}\""),
        }),
    }
}

#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "employees",
    summary = "List employees",
    params(ListEmployeesQuery),
    responses(
        (status = 200, description = "Page of employee records", body = PaginatedResponse<EmployeeResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<ListEmployeesQuery>,
    _current_user: CurrentUser,
) -> Result<Json<PaginatedResponse<EmployeeResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = EmployeeFilter::new(skip, limit)
        .with_search(query.search)
        .with_department(query.department)
        .with_attrition(query.attrition);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Employees::new(&mut conn);
    let total_count = repo.count(&filter).await?;
    let employees = repo.list(&filter).await?;

    let data = employees.into_iter().map(EmployeeResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "employees",
    summary = "Create an employee record",
    request_body = EmployeeCreate,
    responses(
        (status = 201, description = "Employee created", body = EmployeeResponse),
        (status = 400, description = "Invalid employee data"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_employee(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<EmployeeCreate>,
) -> Result<(StatusCode, Json<EmployeeResponse>)> {
    validate_age(create.age)?;
    validate_attrition(create.attributes.attrition.as_deref())?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let employee = Employees::new(&mut conn)
        .create(&EmployeeCreateDBRequest::from(create))
        .await?;

    tracing::info!(employee_id = employee.id, user_id = current_user.id, "Created employee record");
    Ok((StatusCode::CREATED, Json(EmployeeResponse::from(employee))))
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "employees",
    summary = "Get an employee record",
    params(("id" = i64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee record", body = EmployeeResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
    _current_user: CurrentUser,
) -> Result<Json<EmployeeResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let employee = Employees::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| employee_not_found(id))?;

    Ok(Json(EmployeeResponse::from(employee)))
}

#[utoipa::path(
    patch,
    path = "/api/employees/{id}",
    tag = "employees",
    summary = "Update an employee record",
    description = "Partial update: fields left out of the body keep their stored value",
    params(("id" = i64, Path, description = "Employee ID")),
    request_body = EmployeeUpdate,
    responses(
        (status = 200, description = "Updated employee record", body = EmployeeResponse),
        (status = 400, description = "Invalid employee data"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
    _current_user: CurrentUser,
    Json(update): Json<EmployeeUpdate>,
) -> Result<Json<EmployeeResponse>> {
    if let Some(age) = update.age {
        validate_age(age)?;
    }
    validate_attrition(update.attributes.attrition.as_deref())?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let employee = Employees::new(&mut conn)
        .update(id, &EmployeeUpdateDBRequest::from(update))
        .await
        .map_err(|e| match e {
            crate::db::errors::DbError::NotFound => employee_not_found(id),
            other => other.into(),
        })?;

    Ok(Json(EmployeeResponse::from(employee)))
}

#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    tag = "employees",
    summary = "Delete an employee record",
    description = "Administrators only",
    params(("id" = i64, Path, description = "Employee ID")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    require_admin(&current_user, "delete employees")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Employees::new(&mut conn).delete(id).await? {
        return Err(employee_not_found(id));
    }

    tracing::info!(employee_id = id, user_id = current_user.id, "Deleted employee record");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/employees/{id}/predict",
    tag = "employees",
    summary = "Score a stored employee",
    description = "Runs the attrition model over the stored attributes and records the outcome against the employee",
    params(("id" = i64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Prediction for the employee", body = PredictionResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Employee not found"),
        (status = 503, description = "No model artifact is loaded"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all, fields(employee_id = id))]
pub async fn predict_employee(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
    _current_user: CurrentUser,
) -> Result<Json<PredictionResponse>> {
    let predictor = state.predictions.predictor()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let employee = Employees::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| employee_not_found(id))?;

    let scored = state.predictions.predict_one(&employee.attributes.to_raw_record(employee.age))?;

    if state.config.predictions.persist {
        Predictions::new(&mut conn)
            .create(&PredictionCreateDBRequest::from_scored(Some(id), predictor.version(), &scored))
            .await?;
    }

    Ok(Json(PredictionResponse::new(&scored, predictor.version())))
}
