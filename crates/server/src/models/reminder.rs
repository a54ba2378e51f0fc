//! Reminder templates and scan results.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use glamdesk_core::{CustomerId, EncryptedField, EventType, MonthDay, PrincipalId};

/// An owner's message template for one event type.
///
/// At most one exists per `(owner_id, event_type)`; saving again replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderTemplate {
    #[serde(skip)]
    pub owner_id: PrincipalId,
    pub event_type: EventType,
    pub template: String,
    pub updated_at: DateTime<Utc>,
}

/// A customer whose birthday or anniversary falls on the scanned month-day,
/// joined with the owning salon's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderCandidate {
    pub owner_id: PrincipalId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub phone: EncryptedField,
    pub salon_name: String,
    pub birthday: Option<NaiveDate>,
    pub anniversary: Option<NaiveDate>,
}

impl ReminderCandidate {
    /// Which event `target` corresponds to. A birthday match wins over an
    /// anniversary match; `Custom` is returned only if neither date matches.
    #[must_use]
    pub fn classify(&self, target: MonthDay) -> EventType {
        if self.birthday.is_some_and(|d| target.matches(d)) {
            EventType::Birthday
        } else if self.anniversary.is_some_and(|d| target.matches(d)) {
            EventType::Anniversary
        } else {
            EventType::Custom
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn candidate(birthday: Option<&str>, anniversary: Option<&str>) -> ReminderCandidate {
        let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        ReminderCandidate {
            owner_id: PrincipalId::new(1),
            customer_id: CustomerId::new(1),
            customer_name: "Ana".to_string(),
            phone: EncryptedField::default(),
            salon_name: "Shear Bliss".to_string(),
            birthday: birthday.map(parse),
            anniversary: anniversary.map(parse),
        }
    }

    #[test]
    fn test_classify() {
        let target: MonthDay = "06-08".parse().unwrap();
        assert_eq!(
            candidate(Some("1990-06-08"), None).classify(target),
            EventType::Birthday
        );
        assert_eq!(
            candidate(Some("1990-01-01"), Some("2015-06-08")).classify(target),
            EventType::Anniversary
        );
        assert_eq!(
            candidate(Some("1990-06-08"), Some("2015-06-08")).classify(target),
            EventType::Birthday
        );
        assert_eq!(candidate(None, None).classify(target), EventType::Custom);
    }
}
