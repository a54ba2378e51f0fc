//! Glamdesk Core - Shared domain types.
//!
//! This crate provides the types shared by every Glamdesk component:
//! - `server` - HTTP API, field encryption, session tokens, reminder scheduler
//! - `cli` - Command-line tools for migrations, key generation, password hashing
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no
//! cryptography. It stays lightweight so that stores, services and tests can
//! share the same vocabulary.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, event kinds, month-day keys and encrypted fields

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
