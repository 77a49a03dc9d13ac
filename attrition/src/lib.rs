//! # attrition: HR attrition prediction backend
//!
//! `attrition` serves an HTTP API over a store of employee records. It scores how likely an
//! employee is to leave with a gradient-boosted tree model trained offline, keeps a history of
//! those predictions, and aggregates workforce statistics for dashboards.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses SQLite through SQLx for persistence.
//!
//! ### Request Flow
//!
//! Every `/api` request other than registration and login carries a session token, either as
//! an `Authorization: Bearer` header or as the session cookie set at login. The
//! [`CurrentUser`](api::models::users::CurrentUser) extractor verifies it before the handler
//! runs. Handlers talk to the database through the repositories in [`db::handlers`] and to the
//! model through the [`PredictionService`](inference::PredictionService) held in [`AppState`].
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes authentication, employee CRUD, scoring (single records,
//! stored employees and CSV batches), prediction history and analytics.
//!
//! The **inference layer** ([`inference`]) turns raw employee attributes into the model's
//! fixed-order feature vector, evaluates the tree ensemble loaded from a JSON artifact, and
//! maps probabilities to Low/Medium/High risk bands. The artifact is loaded once at startup;
//! when it is missing the rest of the API keeps serving and scoring endpoints return 503.
//!
//! The **database layer** ([`db`]) uses the repository pattern over users, employees and
//! predictions, plus read-only analytics queries.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use attrition::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = attrition::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     attrition::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(attrition::shutdown_signal()).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod inference;
mod openapi;
mod seed;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::password,
    config::CorsOrigin,
    db::handlers::{Employees, Repository, Users, employees::EmployeeFilter},
    db::models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    inference::PredictionService,
    openapi::ApiDoc,
};
use anyhow::Context;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    routing::{get, patch, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::{path::Path, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{EmployeeId, PredictionId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .predictions(PredictionService::from_config(&config.model)?)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// Loaded model, or an unavailable service when no artifact could be loaded
    #[builder(default)]
    pub predictions: PredictionService,
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: an existing account with this email is promoted to admin and, when a password
/// is given, has its password replaced.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, db: &SqlitePool) -> Result<UserId, sqlx::Error> {
    let password_hash = if let Some(pwd) = password {
        Some(password::hash_string(pwd).map_err(|e| sqlx::Error::Encode(format!("Failed to hash admin password: {e}").into()))?)
    } else {
        None
    };

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo
        .get_user_by_email(email)
        .await
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to check existing user: {e}")))?
    {
        user_repo
            .update(
                existing_user.id,
                &UserUpdateDBRequest {
                    role: Some(Role::Admin),
                    password_hash,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| sqlx::Error::Protocol(format!("Failed to update admin user: {e}")))?;
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let user_create = UserCreateDBRequest {
        email: email.to_string(),
        name: "Administrator".to_string(),
        department: None,
        role: Role::Admin,
        password_hash,
    };

    let created_user = user_repo
        .create(&user_create)
        .await
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to create admin user: {e}")))?;

    tx.commit().await?;
    Ok(created_user.id)
}

/// Import the employee dataset into an empty employees table.
///
/// Runs in a single transaction. Returns the number of inserted rows, which is 0 when the
/// table already holds data.
#[instrument(skip(db), err)]
pub async fn seed_employees(path: &Path, db: &SqlitePool) -> anyhow::Result<u64> {
    let mut tx = db.begin().await?;
    let mut repo = Employees::new(&mut tx);

    let existing = repo.count(&EmployeeFilter::new(0, 1)).await?;
    if existing > 0 {
        debug!(existing, "Employees table already populated, skipping seed");
        return Ok(0);
    }

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read employee seed file {}", path.display()))?;
    let employees = seed::parse_employees_csv(&data).with_context(|| format!("Invalid employee seed file {}", path.display()))?;

    let inserted = repo.create_many(&employees).await?;
    tx.commit().await?;

    info!(inserted, "Seeded employees from {}", path.display());
    Ok(inserted)
}

async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let settings = &config.database.pool;
    let mut options = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));
    if settings.idle_timeout_secs > 0 {
        options = options.idle_timeout(Duration::from_secs(settings.idle_timeout_secs));
    }

    let pool = options
        .connect(&config.database.url)
        .await
        .with_context(|| format!("Failed to connect to database at {}", config.database.url))?;

    Ok(pool)
}

/// Migrations, initial admin account and dataset import.
async fn prepare_database(config: &Config, pool: &SqlitePool) -> anyhow::Result<()> {
    migrator().run(pool).await?;

    create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

    match config.seed.employees_csv.as_deref() {
        Some(path) if path.exists() => {
            seed_employees(path, pool).await?;
        }
        Some(path) => warn!("Employee seed file {} does not exist, skipping seed", path.display()),
        None => {}
    }

    Ok(())
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PATCH,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.security.cors.allow_credentials);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Adds the OpenAPI document and Scalar reference, optional Prometheus metrics, CORS and
/// request tracing on top of the API routes.
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .route("/me", get(api::handlers::auth::me))
        .route("/logout", post(api::handlers::auth::logout));

    let employee_routes = Router::new()
        .route(
            "/",
            get(api::handlers::employees::list_employees).post(api::handlers::employees::create_employee),
        )
        .route(
            "/{id}",
            get(api::handlers::employees::get_employee)
                .patch(api::handlers::employees::update_employee)
                .delete(api::handlers::employees::delete_employee),
        )
        .route("/{id}/predict", post(api::handlers::employees::predict_employee));

    // Batch uploads get their own body limit
    let upload_limit = state.config.predictions.max_upload_bytes;
    let predict_routes = Router::new()
        .route("/single", post(api::handlers::predictions::predict_single))
        .route(
            "/batch",
            post(api::handlers::predictions::predict_batch).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/features", get(api::handlers::predictions::list_features))
        .route("/encoders", get(api::handlers::predictions::list_encoders))
        .route("/model", get(api::handlers::predictions::model_info))
        .route("/history", get(api::handlers::predictions::list_history))
        .route("/history/{id}", patch(api::handlers::predictions::update_feedback));

    let analytics_routes = Router::new()
        .route("/dashboard", get(api::handlers::analytics::dashboard))
        .route("/department", get(api::handlers::analytics::by_department))
        .route("/salary", get(api::handlers::analytics::by_salary))
        .route("/role", get(api::handlers::analytics::by_role))
        .route("/risk", get(api::handlers::analytics::risk_distribution));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/employees", employee_routes)
        .nest("/predict", predict_routes)
        .nest("/analytics", analytics_routes)
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

/// The assembled service.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations, creates the
///    initial admin, seeds employees and loads the model artifact
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests drain, the pool is
///    closed and telemetry is flushed
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application on an existing pool. Migrations still run.
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!("Starting attrition service with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => setup_database(&config).await?,
        };
        prepare_database(&config, &pool).await?;

        let predictions = PredictionService::from_config(&config.model).context("Failed to load required model artifact")?;

        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .predictions(predictions)
            .build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Attrition service listening on http://{}, API reference at http://localhost:{}/docs",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
