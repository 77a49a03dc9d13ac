use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Extract a bearer token from the Authorization header.
/// Returns:
/// - None: no Authorization header, or a scheme other than Bearer
/// - Some(Ok(user)): valid token
/// - Some(Err(error)): Bearer token present but invalid
#[instrument(skip(parts, config))]
fn try_bearer_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    let token = auth_str.strip_prefix("Bearer ")?;
    Some(session::verify_session_token(token.trim(), config))
}

/// Extract a session token from the cookie header.
/// Returns:
/// - None: no session cookie present
/// - Some(Ok(user)): valid token
/// - Some(Err(error)): session cookie present but invalid or expired
#[instrument(skip(parts, config))]
fn try_cookie_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.native.session.cookie_name;

    cookie_str
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| name == cookie_name && !value.is_empty())
        .map(|(_, value)| session::verify_session_token(value, config))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if !state.config.auth.native.enabled {
            return Err(Error::Unauthenticated {
                message: Some("Authentication is disabled".to_string()),
            });
        }

        // The header wins over the cookie so API clients are unaffected by a stale browser session
        let mut last_error = None;
        for (method, attempt) in [
            ("bearer token", try_bearer_auth(parts, &state.config)),
            ("session cookie", try_cookie_auth(parts, &state.config)),
        ] {
            match attempt {
                Some(Ok(user)) => {
                    debug!("Authenticated user {} via {method}", user.id);
                    return Ok(user);
                }
                Some(Err(e)) => {
                    trace!("{method} authentication failed: {e:?}");
                    last_error = Some(e);
                }
                None => trace!("No {method} present"),
            }
        }

        Err(last_error.unwrap_or(Error::Unauthenticated {
            message: Some("Not authenticated".to_string()),
        }))
    }
}

/// Fail with 403 unless the user is an administrator.
pub fn require_admin(user: &CurrentUser, action: &str) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action: action.to_string(),
        })
    }
}
