//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Security headers
//!
//! Authentication is not a layer: protected handlers take a
//! [`RequireSession`] argument.

pub mod auth;
pub mod security_headers;

pub use auth::{RequireSession, SESSION_COOKIE, SessionRejection, clear_session_cookie, session_cookie};
pub use security_headers::security_headers_middleware;
