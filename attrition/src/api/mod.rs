//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/api/auth/*`): registration, login, session introspection, logout
//! - **Employees** (`/api/employees/*`): employee record CRUD and per-employee scoring
//! - **Predictions** (`/api/predict/*`): single and batch scoring, model metadata, history
//! - **Analytics** (`/api/analytics/*`): aggregate workforce statistics
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa` annotations. The interactive reference is
//! served at `/docs` and the raw document at `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;
