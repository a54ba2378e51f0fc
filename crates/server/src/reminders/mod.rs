//! Upcoming-event reminders.
//!
//! [`ReminderScheduler`] wakes on a fixed interval, looks `lookahead_days`
//! ahead, finds every customer (across all owners) whose birthday or
//! anniversary falls on that month-day, and hands each one to the
//! [`NotificationDispatcher`].
//!
//! # Repeat policy
//!
//! A tick interval shorter than a day would otherwise message the same
//! customer repeatedly for the same event. With
//! [`RepeatPolicy::OncePerOccurrence`] the scheduler records the occurrence
//! date after each successful send and skips customers already notified for
//! it. [`RepeatPolicy::EveryTick`] sends on every matching pass.

mod dispatcher;
mod scheduler;

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::store::RepositoryError;

pub use dispatcher::{DEFAULT_TEMPLATE, NotificationDispatcher, render, resolve_template};
pub use scheduler::{PassReport, ReminderScheduler};

/// Errors that end a reminder pass early.
#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("reminder scan failed: {0}")]
    Scan(#[from] RepositoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatPolicy {
    #[default]
    OncePerOccurrence,
    EveryTick,
}

impl RepeatPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OncePerOccurrence => "once_per_occurrence",
            Self::EveryTick => "every_tick",
        }
    }
}

impl std::fmt::Display for RepeatPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once_per_occurrence" => Ok(Self::OncePerOccurrence),
            "every_tick" => Ok(Self::EveryTick),
            other => Err(format!(
                "unknown repeat policy '{other}' (expected once_per_occurrence or every_tick)"
            )),
        }
    }
}

/// Scheduler cadence and behaviour.
#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub interval: Duration,
    pub lookahead_days: u32,
    pub repeat_policy: RepeatPolicy,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            lookahead_days: 7,
            repeat_policy: RepeatPolicy::OncePerOccurrence,
        }
    }
}
