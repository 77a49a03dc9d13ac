//! API request and response data models.
//!
//! Request types deserialize JSON bodies and query strings, response types serialize to
//! JSON, and everything that appears in the OpenAPI document derives `utoipa::ToSchema`.
//!
//! - [`auth`]: registration, login and session responses
//! - [`users`]: roles, the authenticated caller and account responses
//! - [`employees`]: employee records and list filters
//! - [`predictions`]: scoring inputs and outputs, history, model metadata
//! - [`analytics`]: aggregate workforce statistics
//! - [`pagination`]: shared `skip`/`limit` handling

pub mod analytics;
pub mod auth;
pub mod employees;
pub mod pagination;
pub mod predictions;
pub mod users;
