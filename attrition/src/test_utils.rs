//! Test utilities shared by the unit and HTTP tests.

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    auth::{
        password::{self, Argon2Params},
        session,
    },
    config::{Config, NativeAuthConfig, PasswordConfig, SessionConfig},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    inference::{Classifier, FeatureEncoder, PredictionService, Predictor, encoder::FEATURE_NAMES},
};
use axum_test::TestServer;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Cheap Argon2 parameters so tests don't spend their time hashing
const TEST_ARGON2: Argon2Params = Argon2Params {
    memory_kib: 256,
    iterations: 1,
    parallelism: 1,
};

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: crate::config::AuthConfig {
            native: NativeAuthConfig {
                enabled: true,
                allow_registration: true,
                password: PasswordConfig {
                    argon2_memory_kib: TEST_ARGON2.memory_kib,
                    argon2_iterations: TEST_ARGON2.iterations,
                    argon2_parallelism: TEST_ARGON2.parallelism,
                    ..Default::default()
                },
                session: SessionConfig {
                    cookie_secure: false,
                    ..Default::default()
                },
            },
            ..Default::default()
        },
        model: crate::config::ModelConfig {
            artifact_path: None,
            required: false,
        },
        seed: crate::config::SeedConfig { employees_csv: None },
        enable_metrics: false,
        enable_otel_export: false,
        ..Default::default()
    }
}

pub fn create_test_state(pool: SqlitePool) -> AppState {
    AppState::builder()
        .db(pool)
        .config(create_test_config())
        .predictions(PredictionService::unavailable())
        .build()
}

fn test_server(state: &AppState) -> TestServer {
    let router = crate::build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Test server with no model loaded.
pub async fn create_test_app(pool: SqlitePool) -> (TestServer, Config) {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: SqlitePool, config: Config) -> (TestServer, Config) {
    let state = AppState::builder().db(pool).config(config.clone()).build();
    (test_server(&state), config)
}

pub async fn create_test_app_with_service(pool: SqlitePool, predictions: PredictionService) -> (TestServer, Config) {
    let config = create_test_config();
    let state = AppState::builder()
        .db(pool)
        .config(config.clone())
        .predictions(predictions)
        .build();
    (test_server(&state), config)
}

static USER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Insert a user whose password is [`TEST_PASSWORD`].
pub async fn create_test_user(pool: &SqlitePool, role: Role) -> UserDBResponse {
    let n = USER_COUNTER.fetch_add(1, Ordering::Relaxed);
    let email = format!("user{n}-{}@example.com", std::process::id());
    let password_hash = password::hash_string_with_params(TEST_PASSWORD, Some(TEST_ARGON2)).expect("Failed to hash test password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email,
            name: format!("Test User {n}"),
            department: Some("Human Resources".to_string()),
            role,
            password_hash: Some(password_hash),
        })
        .await
        .expect("Failed to create test user")
}

pub fn token_for(user: &CurrentUser, config: &Config) -> String {
    session::create_session_token(user, config).expect("Failed to create session token")
}

/// `Authorization: Bearer` header pair for a stored user.
pub fn auth_header(user: &UserDBResponse, config: &Config) -> (String, String) {
    let token = token_for(&CurrentUser::from(user.clone()), config);
    ("authorization".to_string(), format!("Bearer {token}"))
}

/// Classifier that returns the same probability for every input.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbability(pub f64);

impl Classifier for FixedProbability {
    fn predict_proba(&self, _features: &[f64]) -> f64 {
        self.0
    }
}

/// Classifier backed by a closure over the encoded feature vector.
pub struct FnClassifier<F>(F);

impl<F> FnClassifier<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Classifier for FnClassifier<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn predict_proba(&self, features: &[f64]) -> f64 {
        (self.0)(features)
    }
}

/// Category tables of the IBM HR dataset, sorted the way the training encoder sorts them.
fn dataset_categories() -> BTreeMap<String, Vec<String>> {
    let tables: [(&str, &[&str]); 7] = [
        ("BusinessTravel", &["Non-Travel", "Travel_Frequently", "Travel_Rarely"]),
        ("Department", &["Human Resources", "Research & Development", "Sales"]),
        (
            "EducationField",
            &["Human Resources", "Life Sciences", "Marketing", "Medical", "Other", "Technical Degree"],
        ),
        ("Gender", &["Female", "Male"]),
        (
            "JobRole",
            &[
                "Healthcare Representative",
                "Human Resources",
                "Laboratory Technician",
                "Manager",
                "Manufacturing Director",
                "Research Director",
                "Research Scientist",
                "Sales Executive",
                "Sales Representative",
            ],
        ),
        ("MaritalStatus", &["Divorced", "Married", "Single"]),
        ("OverTime", &["No", "Yes"]),
    ];

    tables
        .into_iter()
        .map(|(feature, labels)| (feature.to_string(), labels.iter().map(|l| l.to_string()).collect()))
        .collect()
}

/// A predictor with the production feature layout and the given classifier.
pub fn stub_predictor<C: Classifier + 'static>(classifier: C) -> Predictor {
    let features = FEATURE_NAMES.iter().map(|(_, model)| model.to_string()).collect();
    let encoder = FeatureEncoder::new(features, dataset_categories());
    Predictor::new("test-model", encoder, Box::new(classifier))
}
