//! Core types for Glamdesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod encrypted;
pub mod event;
pub mod id;
pub mod month_day;

pub use email::{Email, EmailError};
pub use encrypted::EncryptedField;
pub use event::{EventType, ParseEventTypeError};
pub use id::*;
pub use month_day::{MonthDay, MonthDayError};
