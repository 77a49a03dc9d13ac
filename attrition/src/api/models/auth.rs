use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::users::UserResponse;

/// Request to register a new account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Email address (must be unique)
    pub email: String,
    /// Password (will be hashed)
    pub password: String,
    pub name: String,
    pub department: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued token plus the account it belongs to
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token; also set as the session cookie
    pub token: String,
    pub user: UserResponse,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// Successful registration: 201 with a session cookie
pub struct RegisterResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::CREATED, &self.cookie, Json(self.auth_response))
    }
}

/// Successful login: 200 with a session cookie
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::OK, &self.cookie, Json(self.auth_response))
    }
}

/// Logout: 200 with an expired session cookie
pub struct LogoutResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::OK, &self.cookie, Json(self.auth_response))
    }
}

fn with_cookie(status: StatusCode, cookie: &str, body: impl IntoResponse) -> Response {
    match HeaderValue::from_str(cookie) {
        Ok(value) => (status, [(header::SET_COOKIE, value)], body).into_response(),
        Err(e) => {
            tracing::error!("Session cookie is not a valid header value: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
