//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `ATTRITION_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ATTRITION_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ATTRITION_MODEL__ARTIFACT_PATH=models/attrition_model.json` sets `model.artifact_path`.
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port`
//! - **Database**: `database.url`, `database.pool` - SQLite connection settings
//! - **Admin User**: `admin_email`, `admin_password` - Initial admin created on first startup
//! - **Authentication**: `auth.native`, `auth.security` - Login, JWT and CORS settings
//! - **Model**: `model.artifact_path` - Trained model artifact served for predictions
//! - **Predictions**: `predictions.persist`, `predictions.max_batch_rows` - Scoring behaviour
//! - **Seed**: `seed.employees_csv` - Dataset imported into an empty employees table
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! ATTRITION_PORT=8080
//! DATABASE_URL="sqlite://attrition.db?mode=rwc"
//! ATTRITION_AUTH__NATIVE__ALLOW_REGISTRATION=false
//! ATTRITION_PREDICTIONS__PERSIST=false
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ATTRITION_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the `DATABASE_URL` environment variable; folded into `database.url` on load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    /// Email address for the initial admin user (created on first startup)
    pub admin_email: String,
    /// Password for the initial admin user
    pub admin_password: Option<String>,
    /// Secret key for JWT signing
    pub secret_key: Option<String>,
    pub auth: AuthConfig,
    pub model: ModelConfig,
    pub predictions: PredictionsConfig,
    pub seed: SeedConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// SQLite connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite://attrition.db?mode=rwc`
    pub url: String,
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://attrition.db?mode=rwc".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Connection pool parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Native email/password authentication
    pub native: NativeAuthConfig,
    /// Security settings (JWT, CORS)
    pub security: SecurityConfig,
}

/// Native email/password authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeAuthConfig {
    /// Enable login and registration
    pub enabled: bool,
    /// Allow new users to self-register
    pub allow_registration: bool,
    pub password: PasswordConfig,
    pub session: SessionConfig,
}

impl Default for NativeAuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_registration: true,
            password: PasswordConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Cookie name for session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "attrition_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "strict".to_string(),
        }
    }
}

/// Password validation and hashing rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Argon2 memory cost in KiB
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
            argon2_memory_kib: 19456, // 19 MB
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

/// Security configuration for JWT and CORS.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// JWT token expiry duration
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    pub cors: CorsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(24 * 60 * 60),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration for browser clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // Vite dev server
            allowed_origins: vec![CorsOrigin::Url(
                Url::parse("http://localhost:5173").expect("static origin is a valid URL"),
            )],
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

/// An allowed CORS origin.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// Trained model artifact settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// JSON artifact written by the training pipeline. Unset disables predictions.
    pub artifact_path: Option<PathBuf>,
    /// Refuse to start when the artifact cannot be loaded
    pub required: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: Some(PathBuf::from("models/attrition_model.json")),
            required: false,
        }
    }
}

/// Prediction endpoint behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PredictionsConfig {
    /// Store every successful prediction in the history table
    pub persist: bool,
    /// Largest number of data rows accepted in one batch upload
    pub max_batch_rows: usize,
    /// Largest accepted upload body, in bytes
    pub max_upload_bytes: usize,
}

impl Default for PredictionsConfig {
    fn default() -> Self {
        Self {
            persist: true,
            max_batch_rows: 10_000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Startup data import.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    /// Employee dataset imported when the employees table is empty
    pub employees_csv: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: None,
            database: DatabaseConfig::default(),
            admin_email: "admin@example.com".to_string(),
            admin_password: None,
            secret_key: None,
            auth: AuthConfig::default(),
            model: ModelConfig::default(),
            predictions: PredictionsConfig::default(),
            seed: SeedConfig::default(),
            enable_metrics: true,
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.auth.native.enabled {
            if self.secret_key.is_none() {
                return Err(Error::Internal {
                    operation: "Config validation: Native authentication is enabled but secret_key is not configured. \
                     Please set ATTRITION_SECRET_KEY environment variable or add secret_key to config file."
                        .to_string(),
                });
            }

            let password = &self.auth.native.password;
            if password.min_length > password.max_length {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: Invalid password configuration: min_length ({}) cannot be greater than max_length ({})",
                        password.min_length, password.max_length
                    ),
                });
            }

            if password.min_length < 1 {
                return Err(Error::Internal {
                    operation: "Config validation: Invalid password configuration: min_length must be at least 1".to_string(),
                });
            }
        }

        if self.auth.security.jwt_expiry.as_secs() < 300 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too short (minimum 5 minutes)".to_string(),
            });
        }

        if self.auth.security.jwt_expiry.as_secs() > 86400 * 30 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too long (maximum 30 days)".to_string(),
            });
        }

        if self.auth.security.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        let has_wildcard = self
            .auth
            .security
            .cors
            .allowed_origins
            .iter()
            .any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.auth.security.cors.allow_credentials {
            return Err(Error::Internal {
                operation: "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                    .to_string(),
            });
        }

        if self.model.required && self.model.artifact_path.is_none() {
            return Err(Error::Internal {
                operation: "Config validation: model.required is set but model.artifact_path is not configured".to_string(),
            });
        }

        if self.predictions.max_batch_rows == 0 {
            return Err(Error::Internal {
                operation: "Config validation: predictions.max_batch_rows cannot be 0".to_string(),
            });
        }

        if self.predictions.max_upload_bytes == 0 {
            return Err(Error::Internal {
                operation: "Config validation: predictions.max_upload_bytes cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("ATTRITION_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_yaml_sections() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: hello
model:
  artifact_path: /srv/models/attrition.json
  required: true
predictions:
  persist: false
  max_batch_rows: 250
seed:
  employees_csv: data/employees.csv
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.model.artifact_path, Some(PathBuf::from("/srv/models/attrition.json")));
            assert!(config.model.required);
            assert!(!config.predictions.persist);
            assert_eq!(config.predictions.max_batch_rows, 250);
            assert_eq!(config.predictions.max_upload_bytes, 10 * 1024 * 1024); // default
            assert_eq!(config.seed.employees_csv, Some(PathBuf::from("data/employees.csv")));

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: hello
port: 9000
"#,
            )?;

            jail.set_env("ATTRITION_HOST", "127.0.0.1");
            jail.set_env("ATTRITION_PORT", "8080");
            jail.set_env("ATTRITION_PREDICTIONS__MAX_BATCH_ROWS", "42");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 8080);
            assert_eq!(config.predictions.max_batch_rows, 42);
            assert_eq!(config.bind_address(), "127.0.0.1:8080");

            Ok(())
        });
    }

    #[test]
    fn test_database_url_env_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: hello
database:
  url: sqlite://from-yaml.db
  pool:
    max_connections: 2
"#,
            )?;
            jail.set_env("DATABASE_URL", "sqlite://from-env.db?mode=rwc");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.database.url, "sqlite://from-env.db?mode=rwc");
            assert_eq!(config.database.pool.max_connections, 2);
            assert!(config.database_url.is_none());

            Ok(())
        });
    }

    #[test]
    fn test_auth_config_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: "test-secret-key-for-testing"
auth:
  native:
    allow_registration: false
    password:
      min_length: 12
  security:
    jwt_expiry: "2h"
    cors:
      allowed_origins: ["https://hr.example.com"]
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert!(config.auth.native.enabled);
            assert!(!config.auth.native.allow_registration);
            assert_eq!(config.auth.native.password.min_length, 12);
            assert_eq!(config.auth.native.password.max_length, 64);
            assert_eq!(config.auth.security.jwt_expiry, Duration::from_secs(2 * 60 * 60));
            assert!(matches!(
                &config.auth.security.cors.allowed_origins[..],
                [CorsOrigin::Url(url)] if url.as_str() == "https://hr.example.com/"
            ));

            Ok(())
        });
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: hello
model:
  path: models/attrition.json
"#,
            )?;

            assert!(Config::load(&args("test.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_config_validation_native_auth_missing_secret() {
        let config = Config::default();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("secret_key is not configured"));
    }

    #[test]
    fn test_config_validation_wildcard_with_credentials() {
        let mut config = Config {
            secret_key: Some("test-key".to_string()),
            ..Default::default()
        };
        config.auth.security.cors.allowed_origins = vec![CorsOrigin::Wildcard];

        assert!(config.validate().unwrap_err().to_string().contains("wildcard"));

        config.auth.security.cors.allow_credentials = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_required_model_needs_path() {
        let mut config = Config {
            secret_key: Some("test-key".to_string()),
            ..Default::default()
        };
        config.model = ModelConfig {
            artifact_path: None,
            required: true,
        };

        assert!(config.validate().unwrap_err().to_string().contains("model.required"));
    }

    #[test]
    fn test_config_validation_batch_limits() {
        let mut config = Config {
            secret_key: Some("test-key".to_string()),
            ..Default::default()
        };
        config.predictions.max_batch_rows = 0;

        assert!(config.validate().unwrap_err().to_string().contains("max_batch_rows"));
    }

    #[test]
    fn test_config_validation_valid_config() {
        let config = Config {
            secret_key: Some("test-secret-key".to_string()),
            ..Default::default()
        };

        assert!(config.validate().is_ok());
    }
}
