use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation { table: Option<String>, message: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                // SQLite reports neither constraint nor table names through the driver, so pull
                // the table out of messages like "UNIQUE constraint failed: users.email".
                let table = table_from_message(db_err.message());
                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()).or_else(|| column_from_message(db_err.message())),
                        table,
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        table,
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// "UNIQUE constraint failed: users.email" -> "users"
fn table_from_message(message: &str) -> Option<String> {
    let (_, target) = message.split_once(": ")?;
    let (table, _) = target.split_once('.')?;
    Some(table.trim().to_string())
}

/// "UNIQUE constraint failed: users.email" -> "email"
fn column_from_message(message: &str) -> Option<String> {
    let (_, target) = message.split_once(": ")?;
    let (_, column) = target.split_once('.')?;
    Some(column.split(',').next().unwrap_or(column).trim().to_string())
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
