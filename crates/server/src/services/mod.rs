//! Business logic between the HTTP handlers and the store.

pub mod auth;
pub mod customers;
