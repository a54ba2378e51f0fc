//! Customer event kinds that can trigger a reminder.

use serde::{Deserialize, Serialize};

/// The closed set of events a reminder template can be attached to.
///
/// Stored and submitted as `birthday`, `anniversary` or `custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Birthday,
    Anniversary,
    /// Any matched date that is neither the birthday nor the anniversary.
    Custom,
}

impl EventType {
    pub const ALL: [Self; 3] = [Self::Birthday, Self::Anniversary, Self::Custom];

    /// Stable identifier used in storage and forms.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Birthday => "birthday",
            Self::Anniversary => "anniversary",
            Self::Custom => "custom",
        }
    }

    /// Human-readable label substituted for `[Event]` in a message.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Birthday => "birthday",
            Self::Anniversary => "anniversary",
            Self::Custom => "special day",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the known event types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid event type: {0}")]
pub struct ParseEventTypeError(pub String);

impl std::str::FromStr for EventType {
    type Err = ParseEventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "birthday" => Ok(Self::Birthday),
            "anniversary" => Ok(Self::Anniversary),
            "custom" => Ok(Self::Custom),
            _ => Err(ParseEventTypeError(s.to_string())),
        }
    }
}
