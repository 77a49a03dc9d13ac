//! Authentication and authorization.
//!
//! Accounts sign in with email and password (hashed with Argon2) and receive an HS256 JWT.
//! The token is returned in the response body and also set as an HTTP-only session cookie,
//! so both API clients and browsers can authenticate:
//!
//! - `Authorization: Bearer <token>` header
//! - the session cookie named by `auth.native.session.cookie_name`
//!
//! Every `/api` route other than register and login extracts a [`CurrentUser`]:
//!
//! ```ignore
//! use attrition::api::models::users::CurrentUser;
//!
//! async fn handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.name)
//! }
//! ```
//!
//! Operations restricted to administrators call [`current_user::require_admin`].
//!
//! [`CurrentUser`]: crate::api::models::users::CurrentUser

pub mod current_user;
pub mod password;
pub mod session;
