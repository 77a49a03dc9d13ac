//! Database record models matching table schemas.
//!
//! Create and update requests are plain structs the repositories bind into SQL; responses
//! derive `sqlx::FromRow`. API models convert from these with `From`, so storage and API
//! representations can evolve separately.

pub mod employees;
pub mod predictions;
pub mod users;
