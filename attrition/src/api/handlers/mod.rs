//! HTTP request handlers for all API endpoints.
//!
//! Every handler except registration and login takes a [`crate::api::models::users::CurrentUser`]
//! extractor, so an unauthenticated request is rejected before any work is done.
//!
//! - [`auth`]: registration, login, current session and logout
//! - [`employees`]: employee CRUD and scoring a stored employee
//! - [`predictions`]: ad-hoc scoring, CSV batch scoring, model metadata and history
//! - [`analytics`]: dashboard and breakdown statistics

pub mod analytics;
pub mod auth;
pub mod employees;
pub mod predictions;
