//! Session extractor.
//!
//! A request is authenticated by a session token in either the
//! `Authorization: Bearer <token>` header or the `token` cookie. The header
//! wins when both are present. Every failure is the same 401 JSON error:
//! callers never learn whether the token was missing, forged or expired.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{
        HeaderMap,
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
    response::{IntoResponse, Response},
};
use tracing::debug;

use glamdesk_core::PrincipalId;

use crate::auth::{IssuedToken, TOKEN_TTL_SECS, TokenService};
use crate::error::AppError;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Extractor that requires a valid session token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireSession(principal_id): RequireSession,
/// ) -> impl IntoResponse {
///     format!("Hello, {principal_id}!")
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequireSession(pub PrincipalId);

/// Error returned when no valid session token was presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    Unauthorized,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => AppError::Unauthorized.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        let token = presented_token(&parts.headers).ok_or(SessionRejection::Unauthorized)?;

        let claims = tokens.verify(token).map_err(|e| {
            debug!(error = %e, "Session token rejected");
            SessionRejection::Unauthorized
        })?;

        Ok(Self(claims.principal_id))
    }
}

/// The bearer token if present, else the session cookie.
fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value that stores a freshly issued token.
#[must_use]
pub fn session_cookie(issued: &IssuedToken) -> String {
    format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={TOKEN_TTL_SECS}",
        issued.token
    )
}

/// `Set-Cookie` value that removes the session cookie.
#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
