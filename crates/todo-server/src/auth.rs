//! Bearer token authentication for task routes.
//!
//! [`AuthUser`] is an axum extractor. Handlers take it as
//! `Option<AuthUser>` and call [`authorize`], which is a no-op unless the
//! server runs with `REQUIRE_AUTH`.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use todo_shared::UserId;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::error::ServerError;

/// The user a verified bearer token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServerError::Unauthorized("Missing bearer token".into()))?;

        state.credentials.authenticate(token).map(AuthUser)
    }
}

/// Gate access to records owned by `owner`.
///
/// `owner` is `None` when the addressed id cannot belong to anyone (for
/// example a malformed id), which only a disabled gate lets through.
pub fn authorize(
    config: &ServerConfig,
    caller: Option<&AuthUser>,
    owner: Option<UserId>,
) -> Result<(), ServerError> {
    if !config.require_auth {
        return Ok(());
    }

    let Some(AuthUser(caller)) = caller else {
        return Err(ServerError::Unauthorized("Not authorized, no valid token".into()));
    };

    if owner == Some(*caller) {
        Ok(())
    } else {
        tracing::warn!(caller = %caller, "rejected access to another user's todos");
        Err(ServerError::Forbidden("Not allowed to access this todo".into()))
    }
}
