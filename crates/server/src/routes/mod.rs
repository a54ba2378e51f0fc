//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness check
//!
//! # Auth
//! POST   /api/register              - Create an owner account (form)
//! POST   /api/login                 - Issue a session token (form)
//! POST   /api/logout                - Clear the session cookie
//!
//! # Profile (requires session)
//! GET    /api/profile               - Caller's profile
//! POST   /api/profile               - Update profile (form)
//!
//! # Customers (requires session)
//! GET    /api/customers             - List
//! GET    /api/customers/search?q=   - Name search
//! POST   /api/customers             - Create (JSON)
//! GET    /api/customers/{id}        - Get
//! PUT    /api/customers/{id}        - Update (JSON)
//! DELETE /api/customers/{id}        - Delete
//!
//! # Reminder settings (requires session)
//! GET    /api/settings/reminders    - List saved templates
//! POST   /api/settings/reminders    - Save a template (form)
//! ```

pub mod auth;
pub mod customers;
pub mod profile;
pub mod settings;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;
use crate::store::Store;

/// Every `/api` route.
pub fn api_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/register", post(auth::register::<S>))
        .route("/login", post(auth::login::<S>))
        .route("/logout", post(auth::logout))
        .route(
            "/profile",
            get(profile::show::<S>).post(profile::update::<S>),
        )
        .route(
            "/customers",
            get(customers::list::<S>).post(customers::create::<S>),
        )
        .route("/customers/search", get(customers::search::<S>))
        .route(
            "/customers/{id}",
            get(customers::show::<S>)
                .put(customers::update::<S>)
                .delete(customers::delete::<S>),
        )
        .route(
            "/settings/reminders",
            get(settings::list::<S>).post(settings::save::<S>),
        )
}
