//! Glamdesk server library.
//!
//! The trust boundary of a multi-tenant salon service:
//!
//! - [`crypto`] - AES-256-GCM field encryption and Argon2id password hashing
//! - [`auth`] - HMAC-signed, 24-hour session tokens
//! - [`services`] - registration, login, profile and the customer directory
//! - [`reminders`] - the birthday/anniversary scheduler and message dispatcher
//! - [`delivery`] - outbound SMS
//! - [`store`] - `PostgreSQL` and in-memory backends
//! - [`routes`] / [`middleware`] - the axum HTTP surface
//!
//! Exposed as a library so the binary, the CLI and the integration tests
//! share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod delivery;
pub mod error;
pub mod middleware;
pub mod models;
pub mod reminders;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

use std::time::Duration;

use axum::{Router, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;
use crate::store::Store;

/// Build the full HTTP application for `state`.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", routes::api_routes::<S>())
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
