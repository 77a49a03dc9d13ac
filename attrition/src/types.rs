//! Common type definitions.
//!
//! All entity IDs are SQLite `INTEGER PRIMARY KEY` values wrapped in type aliases so
//! signatures say which table an ID belongs to:
//!
//! - [`UserId`]: API account identifier
//! - [`EmployeeId`]: Employee record identifier
//! - [`PredictionId`]: Persisted prediction identifier

pub type UserId = i64;
pub type EmployeeId = i64;
pub type PredictionId = i64;
