use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse, RegisterRequest, RegisterResponse},
        users::{CurrentUser, Role, UserResponse},
    },
    auth::{
        password::{self, Argon2Params},
        session,
    },
    config::Config,
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
};

const INVALID_CREDENTIALS: &str = "Incorrect email or password";

/// Register a new account. New accounts always get the `user` role.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input, email already registered, or registration disabled"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<RegisterResponse, Error> {
    let native = &state.config.auth.native;
    if !native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }
    if !native.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let email = request.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }
    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Name is required".to_string(),
        });
    }
    password::validate_length(&request.password, &native.password)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);
    if user_repo.get_user_by_email(&email).await?.is_some() {
        return Err(Error::BadRequest {
            message: "Email already registered".to_string(),
        });
    }

    // Hash on a blocking thread to avoid stalling the runtime
    let params = Argon2Params::from(&native.password);
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            email,
            name: request.name.trim().to_string(),
            department: request.department,
            role: Role::User,
            password_hash: Some(password_hash),
        })
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let (auth_response, cookie) = issue_session(UserResponse::from(created_user), &state.config)?;
    Ok(RegisterResponse { auth_response, cookie })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Incorrect email or password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_user_by_email(&request.email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid_credentials)?;

    let hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;
    let password = request.password;
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;
    if !is_valid {
        return Err(invalid_credentials());
    }

    let (auth_response, cookie) = issue_session(UserResponse::from(user), &state.config)?;
    Ok(LoginResponse { auth_response, cookie })
}

/// The authenticated account
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account no longer exists"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: current_user.id.to_string(),
        })?;

    Ok(Json(UserResponse::from(user)))
}

/// Logout (clear the session cookie)
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    let session_config = &state.config.auth.native.session;
    let cookie = format!(
        "{}=; Path=/; HttpOnly;{} SameSite={}; Max-Age=0",
        session_config.cookie_name,
        if session_config.cookie_secure { " Secure;" } else { "" },
        session_config.cookie_same_site
    );

    Ok(LogoutResponse {
        auth_response: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
        cookie,
    })
}

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some(INVALID_CREDENTIALS.to_string()),
    }
}

fn issue_session(user: UserResponse, config: &Config) -> Result<(AuthResponse, String), Error> {
    let current_user = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        department: user.department.clone(),
        role: user.role,
    };
    let token = session::create_session_token(&current_user, config)?;
    let cookie = create_session_cookie(&token, config);

    Ok((AuthResponse { token, user }, cookie))
}

fn create_session_cookie(token: &str, config: &Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = config.auth.security.jwt_expiry.as_secs();

    format!(
        "{}={}; Path=/; HttpOnly;{} SameSite={}; Max-Age={}",
        session_config.cookie_name,
        token,
        if session_config.cookie_secure { " Secure;" } else { "" },
        session_config.cookie_same_site,
        max_age
    )
}
