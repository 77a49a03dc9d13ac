//! Password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::PasswordConfig;
use crate::errors::Error;

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MB
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl From<&PasswordConfig> for Argon2Params {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// Hash a password with the given parameters, or secure defaults if None.
pub fn hash_string_with_params(input: &str, params: Option<Argon2Params>) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = params.unwrap_or_default().to_argon2()?;

    let hash = argon2.hash_password(input.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash string: {e}"),
    })?;

    Ok(hash.to_string())
}

pub fn hash_string(input: &str) -> Result<String, Error> {
    hash_string_with_params(input, None)
}

/// Verify a password against a stored hash.
///
/// Verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse hash: {e}"),
    })?;

    Ok(Argon2::default().verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

/// Check a candidate password against the configured length bounds.
pub fn validate_length(password: &str, config: &PasswordConfig) -> Result<(), Error> {
    let length = password.chars().count();
    if length < config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", config.min_length),
        });
    }
    if length > config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at most {} characters", config.max_length),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> Option<Argon2Params> {
        Some(Argon2Params {
            memory_kib: 128,
            iterations: 1,
            parallelism: 1,
        })
    }

    #[test]
    fn test_string_hashing() {
        let hash = hash_string("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_string("test_password_123", &hash).unwrap());
        assert!(!verify_string("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_input_different_salts() {
        let hash1 = hash_string_with_params("password", fast_params()).unwrap();
        let hash2 = hash_string_with_params("password", fast_params()).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_string("password", &hash1).unwrap());
        assert!(verify_string("password", &hash2).unwrap());
    }

    #[test]
    fn test_params_from_config_are_embedded_in_hash() {
        let config = PasswordConfig {
            argon2_memory_kib: 256,
            argon2_iterations: 1,
            ..Default::default()
        };
        let hash = hash_string_with_params("password", Some(Argon2Params::from(&config))).unwrap();

        assert!(hash.contains("m=256,t=1,p=1"));
    }

    #[test]
    fn test_invalid_hash_is_internal_error() {
        let result = verify_string("password", "not-a-hash");
        assert!(matches!(result, Err(Error::Internal { .. })));
    }

    #[test]
    fn test_validate_length() {
        let config = PasswordConfig::default();

        assert!(validate_length("longenough", &config).is_ok());
        assert!(matches!(validate_length("short", &config), Err(Error::BadRequest { .. })));
        assert!(validate_length(&"x".repeat(65), &config).is_err());
        assert!(validate_length(&"x".repeat(64), &config).is_ok());
    }
}
