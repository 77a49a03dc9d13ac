//! OpenAPI document for the HTTP API, served at `/api-docs/openapi.json` and rendered by
//! Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Registers the `bearer_auth` scheme referenced by every protected path.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearer_auth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token returned by `/api/auth/login` or `/api/auth/register`:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```\n\n\
                            Browsers may send the session cookie instead.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::me,
        api::handlers::auth::logout,
        api::handlers::employees::list_employees,
        api::handlers::employees::create_employee,
        api::handlers::employees::get_employee,
        api::handlers::employees::update_employee,
        api::handlers::employees::delete_employee,
        api::handlers::employees::predict_employee,
        api::handlers::predictions::predict_single,
        api::handlers::predictions::predict_batch,
        api::handlers::predictions::list_features,
        api::handlers::predictions::list_encoders,
        api::handlers::predictions::model_info,
        api::handlers::predictions::list_history,
        api::handlers::predictions::update_feedback,
        api::handlers::analytics::dashboard,
        api::handlers::analytics::by_department,
        api::handlers::analytics::by_salary,
        api::handlers::analytics::by_role,
        api::handlers::analytics::risk_distribution,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::auth::AuthSuccessResponse,
            api::models::users::UserResponse,
            api::models::users::Role,
            api::models::employees::EmployeeAttributes,
            api::models::employees::EmployeeCreate,
            api::models::employees::EmployeeUpdate,
            api::models::employees::EmployeeResponse,
            api::models::predictions::PredictionInput,
            crate::inference::RawValue,
            api::models::predictions::PredictionResponse,
            api::models::predictions::BatchUpload,
            api::models::predictions::BatchPredictionResponse,
            api::models::predictions::PredictionRecordResponse,
            api::models::predictions::FeedbackUpdate,
            api::models::predictions::FeatureInfo,
            api::models::predictions::EncodersResponse,
            api::models::predictions::ModelInfoResponse,
            api::models::analytics::DashboardStats,
            api::models::analytics::DepartmentStats,
            api::models::analytics::SalaryRangeStats,
            api::models::analytics::RoleStats,
            api::models::analytics::RiskDistribution,
            crate::inference::RiskLevel,
            crate::inference::ModelMetrics,
        )
    ),
    tags(
        (name = "authentication", description = "Account registration and session management"),
        (name = "employees", description = "Employee records"),
        (name = "predictions", description = "Attrition risk scoring.

Scores are produced by a gradient-boosted tree model loaded at startup. Probabilities below 0.3 are `Low` risk, \
below 0.7 `Medium`, and `High` otherwise. While no model is loaded every scoring endpoint returns 503."),
        (name = "analytics", description = "Aggregate workforce statistics"),
    ),
    info(
        title = "Attrition API",
        description = "Employee records, workforce analytics and attrition risk predictions.

## Errors

Errors are returned as JSON with a single human readable `detail` field:

```json
{ \"detail\": \"Employee not found\" }
```",
    ),
)]
pub struct ApiDoc;
