//! Repositories: one per table, plus the read-only analytics queries.
//!
//! Each repository borrows a `SqliteConnection` for its lifetime. Handlers acquire a pooled
//! connection (or begin a transaction) and construct the repository they need.

pub mod analytics;
pub mod employees;
pub mod predictions;
pub mod repository;
pub mod users;

pub use analytics::Analytics;
pub use employees::Employees;
pub use predictions::Predictions;
pub use repository::Repository;
pub use users::Users;
