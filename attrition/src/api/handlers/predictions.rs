use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde_json::{Map, Value};

use crate::{
    AppState,
    api::models::{
        pagination::PaginatedResponse,
        predictions::{
            BatchPredictionResponse, BatchUpload, EncodersResponse, FeatureInfo, FeedbackUpdate, ListPredictionsQuery, ModelInfoResponse,
            PredictionInput, PredictionRecordResponse, PredictionResponse,
        },
        users::CurrentUser,
    },
    db::{
        errors::DbError,
        handlers::{Predictions, Repository, predictions::PredictionFilter},
        models::predictions::{PredictionCreateDBRequest, PredictionUpdateDBRequest},
    },
    errors::{Error, Result},
    inference::{
        PredictionService,
        batch::{BatchOutcome, parse_csv},
        encoder::raw_name,
    },
    types::PredictionId,
};

#[utoipa::path(
    post,
    path = "/api/predict/single",
    tag = "predictions",
    summary = "Score one employee",
    description = "Every attribute is optional; omitted features encode as 0 and unseen categorical labels as -1",
    request_body = PredictionInput,
    responses(
        (status = 200, description = "Prediction", body = PredictionResponse),
        (status = 400, description = "A numeric attribute could not be parsed"),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "No model artifact is loaded"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn predict_single(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<PredictionInput>,
) -> Result<Json<PredictionResponse>> {
    let predictor = state.predictions.predictor()?;
    let scored = state.predictions.predict_one(&input.to_raw_record())?;

    if state.config.predictions.persist {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Predictions::new(&mut conn)
            .create(&PredictionCreateDBRequest::from_scored(input.employee_id, predictor.version(), &scored))
            .await?;
    }

    Ok(Json(PredictionResponse::new(&scored, predictor.version())))
}

/// Output row for one batch outcome: the uploaded cells in column order, then the scoring columns.
fn batch_row_json(outcome: &BatchOutcome) -> Map<String, Value> {
    let mut row: Map<String, Value> = outcome
        .row
        .fields
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();

    match &outcome.result {
        Ok(scored) => {
            row.insert("prediction".to_string(), Value::from(scored.label));
            row.insert("probability".to_string(), Value::from(scored.probability));
            row.insert("riskLevel".to_string(), Value::from(scored.risk_level.as_str()));
        }
        Err(e) => {
            row.insert("prediction".to_string(), Value::Null);
            row.insert("probability".to_string(), Value::Null);
            row.insert("riskLevel".to_string(), Value::Null);
            row.insert("error".to_string(), Value::from(e.to_string()));
        }
    }
    row
}

async fn read_csv_upload(mut multipart: Multipart) -> Result<Vec<u8>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let is_csv = field
            .file_name()
            .is_some_and(|name| name.to_ascii_lowercase().ends_with(".csv"));
        if !is_csv {
            return Err(Error::BadRequest {
                message: "Only CSV files are accepted".to_string(),
            });
        }

        let bytes = field.bytes().await.map_err(|e| Error::BadRequest {
            message: format!("Failed to read uploaded file: {e}"),
        })?;
        return Ok(bytes.to_vec());
    }

    Err(Error::BadRequest {
        message: "Missing 'file' field in upload".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/predict/batch",
    tag = "predictions",
    summary = "Score a CSV of employees",
    description = "Each row is scored independently and returned in upload order. Rows that cannot be \
                   encoded carry an `error` and null scores without affecting the other rows.",
    request_body(content = BatchUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Scored rows", body = BatchPredictionResponse),
        (status = 400, description = "Not a CSV file, or not parseable as tabular rows"),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "No model artifact is loaded"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn predict_batch(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<BatchPredictionResponse>> {
    // Fail before reading the upload if nothing can be scored
    let version = state.predictions.predictor()?.version().to_string();
    let data = read_csv_upload(multipart).await?;

    let service: PredictionService = state.predictions.clone();
    let max_rows = state.config.predictions.max_batch_rows;
    let outcomes = tokio::task::spawn_blocking(move || {
        let rows = parse_csv(&data, max_rows)?;
        service.predict_batch(rows)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn batch scoring task: {e}"),
    })??;

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    tracing::info!(rows = outcomes.len(), failed, "Scored batch upload");

    if state.config.predictions.persist {
        let records: Vec<PredictionCreateDBRequest> = outcomes
            .iter()
            .filter_map(|outcome| {
                let scored = outcome.result.as_ref().ok()?;
                let employee_id = outcome.row.get("employee_id").and_then(|id| id.parse().ok());
                Some(PredictionCreateDBRequest::from_scored(employee_id, &version, scored))
            })
            .collect();

        let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
        Predictions::new(&mut tx).create_many(&records).await?;
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    }

    Ok(Json(BatchPredictionResponse {
        total: outcomes.len(),
        failed,
        predictions: outcomes.iter().map(batch_row_json).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/predict/features",
    tag = "predictions",
    summary = "Model input features",
    responses(
        (status = 200, description = "Features in the order the model consumes them", body = Vec<FeatureInfo>),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "No model artifact is loaded"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_features(State(state): State<AppState>, _current_user: CurrentUser) -> Result<Json<Vec<FeatureInfo>>> {
    let encoder = state.predictions.predictor()?.encoder();

    let features = encoder
        .features()
        .iter()
        .map(|name| FeatureInfo {
            name: name.clone(),
            raw_name: raw_name(name).map(str::to_string),
            categorical: encoder.is_categorical(name),
        })
        .collect();

    Ok(Json(features))
}

#[utoipa::path(
    get,
    path = "/api/predict/encoders",
    tag = "predictions",
    summary = "Categorical encoding table",
    description = "Raw field name to label to integer code. Labels not listed encode as -1.",
    responses(
        (status = 200, description = "Encoding table", body = EncodersResponse),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "No model artifact is loaded"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_encoders(State(state): State<AppState>, _current_user: CurrentUser) -> Result<Json<EncodersResponse>> {
    let encoder = state.predictions.predictor()?.encoder();

    let table = encoder
        .categories()
        .iter()
        .map(|(feature, classes)| {
            let field = raw_name(feature).unwrap_or(feature.as_str()).to_string();
            let codes = classes
                .iter()
                .enumerate()
                .map(|(code, label)| (label.clone(), code as i64))
                .collect();
            (field, codes)
        })
        .collect();

    Ok(Json(EncodersResponse(table)))
}

#[utoipa::path(
    get,
    path = "/api/predict/model",
    tag = "predictions",
    summary = "Loaded model metadata",
    description = "Reports `loaded: false` rather than failing when no artifact is loaded",
    responses(
        (status = 200, description = "Model metadata", body = ModelInfoResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn model_info(State(state): State<AppState>, _current_user: CurrentUser) -> Result<Json<ModelInfoResponse>> {
    let info = match state.predictions.predictor() {
        Ok(predictor) => ModelInfoResponse {
            loaded: true,
            version: Some(predictor.version().to_string()),
            feature_count: predictor.encoder().features().len(),
            metrics: predictor.metrics().cloned(),
        },
        Err(_) => ModelInfoResponse {
            loaded: false,
            version: None,
            feature_count: 0,
            metrics: None,
        },
    };

    Ok(Json(info))
}

#[utoipa::path(
    get,
    path = "/api/predict/history",
    tag = "predictions",
    summary = "Prediction history",
    description = "Persisted predictions, newest first",
    params(ListPredictionsQuery),
    responses(
        (status = 200, description = "Page of stored predictions", body = PaginatedResponse<PredictionRecordResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<ListPredictionsQuery>,
    _current_user: CurrentUser,
) -> Result<Json<PaginatedResponse<PredictionRecordResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Predictions::new(&mut conn);
    let total_count = repo.count().await?;
    let records = repo.list(&PredictionFilter::new(skip, limit)).await?;

    let data = records.into_iter().map(PredictionRecordResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    patch,
    path = "/api/predict/history/{id}",
    tag = "predictions",
    summary = "Record feedback on a prediction",
    description = "Only the feedback field is mutable; null clears it",
    params(("id" = i64, Path, description = "Prediction ID")),
    request_body = FeedbackUpdate,
    responses(
        (status = 200, description = "Updated prediction", body = PredictionRecordResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Prediction not found"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_feedback(
    State(state): State<AppState>,
    Path(id): Path<PredictionId>,
    _current_user: CurrentUser,
    Json(update): Json<FeedbackUpdate>,
) -> Result<Json<PredictionRecordResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let record = Predictions::new(&mut conn)
        .update(id, &PredictionUpdateDBRequest { feedback: update.feedback })
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::NotFound {
                resource: "Prediction".to_string(),
                id: id.to_string(),
            },
            other => other.into(),
        })?;

    Ok(Json(PredictionRecordResponse::from(record)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::inference::PredictionService;
    use crate::test_utils::{
        FixedProbability, FnClassifier, auth_header, create_test_app, create_test_app_with_service, create_test_user, stub_predictor,
    };
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    fn scenario_input() -> Value {
        json!({
            "age": 30,
            "department": "IT",
            "job_role": "Software Engineer",
            "monthly_income": 50000,
            "over_time": "No"
        })
    }

    fn csv_upload(file_name: &str, contents: &str) -> MultipartForm {
        MultipartForm::new().add_part("file", Part::bytes(contents.as_bytes().to_vec()).file_name(file_name))
    }

    /// Probability keyed off the age feature, which is first in the model order
    fn age_keyed_service() -> PredictionService {
        PredictionService::new(stub_predictor(FnClassifier::new(|features| match features[0] as i64 {
            20 => 0.1,
            30 => 0.5,
            _ => 0.9,
        })))
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_single_prediction_high_risk(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let service = PredictionService::new(stub_predictor(FixedProbability(0.82)));
        let (server, config) = create_test_app_with_service(pool, service).await;
        let (name, value) = auth_header(&user, &config);

        let response = server.post("/api/predict/single").add_header(&name, &value).json(&scenario_input()).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["prediction"], 1);
        assert_eq!(body["probability"], 0.82);
        assert_eq!(body["riskLevel"], "High");
        assert_eq!(body["modelVersion"], "test-model");
        assert_eq!(body["summary"], "High attrition risk (82.0% probability of leaving).");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_single_prediction_medium_risk(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let service = PredictionService::new(stub_predictor(FixedProbability(0.5)));
        let (server, config) = create_test_app_with_service(pool, service).await;
        let (name, value) = auth_header(&user, &config);

        let response = server.post("/api/predict/single").add_header(&name, &value).json(&scenario_input()).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["riskLevel"], "Medium");
        assert_eq!(body["prediction"], 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_single_prediction_with_unseen_category(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let service = PredictionService::new(stub_predictor(FixedProbability(0.2)));
        let (server, config) = create_test_app_with_service(pool, service).await;
        let (name, value) = auth_header(&user, &config);

        let response = server
            .post("/api/predict/single")
            .add_header(&name, &value)
            .json(&json!({"age": 30, "department": "Quantum Research", "job_role": "Astronaut"}))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["riskLevel"], "Low");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_single_prediction_accepts_encoded_category_codes(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        // Department is the fourth model feature; code 1 is "Research & Development"
        let service = PredictionService::new(stub_predictor(FnClassifier::new(|features| {
            if features[3] == 1.0 { 0.9 } else { 0.1 }
        })));
        let (server, config) = create_test_app_with_service(pool, service).await;
        let (name, value) = auth_header(&user, &config);

        for (department, expected) in [
            (json!(1), "High"),
            (json!("Research & Development"), "High"),
            (json!(7), "Low"),
            (json!(1.5), "Low"),
        ] {
            let response = server
                .post("/api/predict/single")
                .add_header(&name, &value)
                .json(&json!({"age": 30, "department": department}))
                .await;

            response.assert_status_ok();
            assert_eq!(response.json::<Value>()["riskLevel"], expected, "department {department}");
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_single_prediction_parses_numeric_text(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let service = PredictionService::new(stub_predictor(FnClassifier::new(|features| {
            if features[0] == 41.0 { 0.9 } else { 0.1 }
        })));
        let (server, config) = create_test_app_with_service(pool, service).await;
        let (name, value) = auth_header(&user, &config);

        let response = server
            .post("/api/predict/single")
            .add_header(&name, &value)
            .json(&json!({"age": " 41 ", "department": "Sales"}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["riskLevel"], "High");

        let response = server
            .post("/api/predict/single")
            .add_header(&name, &value)
            .json(&json!({"age": "thirty", "department": "Sales"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["detail"],
            "feature 'age' expects a number, got 'thirty'"
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_single_prediction_without_model_is_unavailable(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let (server, config) = create_test_app(pool).await;
        let (name, value) = auth_header(&user, &config);

        let response = server.post("/api/predict/single").add_header(&name, &value).json(&scenario_input()).await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.json::<Value>()["detail"],
            "Model not available. Please train the model first."
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_single_prediction_is_persisted_with_employee_reference(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let service = PredictionService::new(stub_predictor(FixedProbability(0.1)));
        let (server, config) = create_test_app_with_service(pool, service).await;
        let (name, value) = auth_header(&user, &config);

        let mut input = scenario_input();
        input["employee_id"] = json!(12);
        server
            .post("/api/predict/single")
            .add_header(&name, &value)
            .json(&input)
            .await
            .assert_status_ok();

        let history: Value = server.get("/api/predict/history").add_header(&name, &value).await.json();
        assert_eq!(history["total_count"], 1);
        let record = &history["data"][0];
        assert_eq!(record["employeeId"], 12);
        assert_eq!(record["prediction"], "No");
        assert_eq!(record["riskLevel"], "Low");
        assert_eq!(record["modelVersion"], "test-model");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_batch_preserves_row_order(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let (server, config) = create_test_app_with_service(pool, age_keyed_service()).await;
        let (name, value) = auth_header(&user, &config);

        let csv = "job_role,department,age\nSales Executive,Sales,20\nManager,Sales,30\nResearch Scientist,Research & Development,40\n";
        let response = server
            .post("/api/predict/batch")
            .add_header(&name, &value)
            .multipart(csv_upload("employees.csv", csv))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["total"], 3);
        assert_eq!(body["failed"], 0);

        let rows = body["predictions"].as_array().unwrap();
        let levels: Vec<_> = rows.iter().map(|r| r["riskLevel"].as_str().unwrap()).collect();
        assert_eq!(levels, vec!["Low", "Medium", "High"]);
        let ages: Vec<_> = rows.iter().map(|r| r["age"].as_str().unwrap()).collect();
        assert_eq!(ages, vec!["20", "30", "40"]);
        assert_eq!(rows[2]["job_role"], "Research Scientist");
        let columns: Vec<_> = rows[0].as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            columns,
            vec!["job_role", "department", "age", "prediction", "probability", "riskLevel"]
        );
        assert_eq!(rows[0]["prediction"], 0);
        assert_eq!(rows[2]["prediction"], 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_batch_row_failure_is_marked_inline(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let (server, config) = create_test_app_with_service(pool, age_keyed_service()).await;
        let (name, value) = auth_header(&user, &config);

        let csv = "employee_id,age,department\n1,20,Sales\n2,thirty,Sales\n3,40,Sales\n";
        let response = server
            .post("/api/predict/batch")
            .add_header(&name, &value)
            .multipart(csv_upload("employees.csv", csv))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["total"], 3);
        assert_eq!(body["failed"], 1);

        let rows = body["predictions"].as_array().unwrap();
        assert_eq!(rows[0]["riskLevel"], "Low");
        assert!(rows[1]["riskLevel"].is_null());
        assert!(rows[1]["error"].as_str().unwrap().contains("age"));
        assert_eq!(rows[2]["riskLevel"], "High");

        // Only the scored rows are stored
        let history: Value = server.get("/api/predict/history").add_header(&name, &value).await.json();
        assert_eq!(history["total_count"], 2);
        assert_eq!(history["data"][0]["employeeId"], 3);
        assert_eq!(history["data"][1]["employeeId"], 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_batch_rejects_non_csv_upload(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let (server, config) = create_test_app_with_service(pool, age_keyed_service()).await;
        let (name, value) = auth_header(&user, &config);

        let response = server
            .post("/api/predict/batch")
            .add_header(&name, &value)
            .multipart(csv_upload("employees.xlsx", "age\n30\n"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["detail"], "Only CSV files are accepted");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_batch_rejects_malformed_csv(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let (server, config) = create_test_app_with_service(pool, age_keyed_service()).await;
        let (name, value) = auth_header(&user, &config);

        let response = server
            .post("/api/predict/batch")
            .add_header(&name, &value)
            .multipart(csv_upload("employees.csv", "age,department\n30,Sales,extra\n"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_batch_without_model_is_unavailable(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let (server, config) = create_test_app(pool).await;
        let (name, value) = auth_header(&user, &config);

        let response = server
            .post("/api/predict/batch")
            .add_header(&name, &value)
            .multipart(csv_upload("employees.csv", "age\n30\n"))
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_features_and_encoders(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let service = PredictionService::new(stub_predictor(FixedProbability(0.5)));
        let (server, config) = create_test_app_with_service(pool, service).await;
        let (name, value) = auth_header(&user, &config);

        let features: Value = server.get("/api/predict/features").add_header(&name, &value).await.json();
        let features = features.as_array().unwrap();
        assert_eq!(features.len(), 30);
        assert_eq!(features[0], json!({"name": "Age", "rawName": "age", "categorical": false}));
        assert!(features.iter().any(|f| f["name"] == "OverTime" && f["categorical"] == true));

        let encoders: Value = server.get("/api/predict/encoders").add_header(&name, &value).await.json();
        assert_eq!(encoders["over_time"], json!({"No": 0, "Yes": 1}));
        assert_eq!(encoders["department"]["Sales"], 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_model_info(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let (server, config) = create_test_app(pool.clone()).await;
        let (name, value) = auth_header(&user, &config);

        let unloaded: Value = server.get("/api/predict/model").add_header(&name, &value).await.json();
        assert_eq!(unloaded["loaded"], false);
        assert!(unloaded["version"].is_null());

        let service = PredictionService::new(stub_predictor(FixedProbability(0.5)));
        let (server, _) = create_test_app_with_service(pool, service).await;
        let loaded: Value = server.get("/api/predict/model").add_header(&name, &value).await.json();
        assert_eq!(loaded["loaded"], true);
        assert_eq!(loaded["version"], "test-model");
        assert_eq!(loaded["featureCount"], 30);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_feedback_updates_only_feedback(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let service = PredictionService::new(stub_predictor(FixedProbability(0.9)));
        let (server, config) = create_test_app_with_service(pool, service).await;
        let (name, value) = auth_header(&user, &config);

        server
            .post("/api/predict/single")
            .add_header(&name, &value)
            .json(&scenario_input())
            .await
            .assert_status_ok();
        let history: Value = server.get("/api/predict/history").add_header(&name, &value).await.json();
        let id = history["data"][0]["id"].as_i64().unwrap();

        let updated = server
            .patch(&format!("/api/predict/history/{id}"))
            .add_header(&name, &value)
            .json(&json!({"feedback": "Left for a competitor"}))
            .await;
        updated.assert_status_ok();
        let updated: Value = updated.json();
        assert_eq!(updated["feedback"], "Left for a competitor");
        assert_eq!(updated["riskLevel"], "High");
        assert_eq!(updated["probability"], 0.9);

        server
            .patch("/api/predict/history/9999")
            .add_header(&name, &value)
            .json(&json!({"feedback": null}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
