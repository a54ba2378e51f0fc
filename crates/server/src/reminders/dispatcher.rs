//! Template rendering and delivery.

use tracing::warn;

use crate::delivery::{DeliveryChannel, DeliveryError, mask_destination};
use crate::models::ReminderTemplate;

/// Used when an owner has not saved a template for the event type, or saved
/// a blank one.
pub const DEFAULT_TEMPLATE: &str =
    "Dear [CustomerName], greetings from [SalonName] on your [Event]!";

const CUSTOMER_NAME: &str = "[CustomerName]";
const SALON_NAME: &str = "[SalonName]";
const EVENT: &str = "[Event]";

/// The stored template body, or [`DEFAULT_TEMPLATE`].
#[must_use]
pub fn resolve_template(stored: Option<&ReminderTemplate>) -> &str {
    match stored {
        Some(t) if !t.template.trim().is_empty() => &t.template,
        _ => DEFAULT_TEMPLATE,
    }
}

/// Substitute the three placeholders in a single left-to-right pass.
///
/// Substituted values are copied verbatim and never re-scanned, so a customer
/// named `[SalonName]` stays `[SalonName]`. Unknown bracketed text is left
/// untouched.
#[must_use]
pub fn render(template: &str, customer_name: &str, salon_name: &str, event_label: &str) -> String {
    let mut out = String::with_capacity(template.len() + customer_name.len() + salon_name.len());
    let mut rest = template;

    while let Some(open) = rest.find('[') {
        let (before, tail) = rest.split_at(open);
        out.push_str(before);

        let replacement = [
            (CUSTOMER_NAME, customer_name),
            (SALON_NAME, salon_name),
            (EVENT, event_label),
        ]
        .into_iter()
        .find(|(token, _)| tail.starts_with(token));

        if let Some((token, value)) = replacement {
            out.push_str(value);
            rest = tail.get(token.len()..).unwrap_or_default();
        } else {
            out.push('[');
            rest = tail.get(1..).unwrap_or_default();
        }
    }
    out.push_str(rest);
    out
}

/// Sends rendered messages through a [`DeliveryChannel`].
#[derive(Debug, Clone)]
pub struct NotificationDispatcher<C> {
    channel: C,
}

impl<C: DeliveryChannel> NotificationDispatcher<C> {
    #[must_use]
    pub const fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Hand `message` to the channel. Failures are logged and returned.
    ///
    /// # Errors
    ///
    /// Returns the channel's [`DeliveryError`].
    pub async fn dispatch(&self, destination: &str, message: &str) -> Result<(), DeliveryError> {
        self.channel
            .send(destination, message)
            .await
            .inspect_err(|e| {
                warn!(to = %mask_destination(destination), error = %e, "Notification dispatch failed");
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use glamdesk_core::{EventType, PrincipalId};

    use super::*;
    use crate::delivery::RecordingChannel;

    fn stored(body: &str) -> ReminderTemplate {
        ReminderTemplate {
            owner_id: PrincipalId::new(1),
            event_type: EventType::Birthday,
            template: body.to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_template_rendering() {
        assert_eq!(
            render(DEFAULT_TEMPLATE, "Ana", "Shear Bliss", "birthday"),
            "Dear Ana, greetings from Shear Bliss on your birthday!"
        );
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        assert_eq!(
            render("[CustomerName]! [CustomerName]?", "Bo", "S", "e"),
            "Bo! Bo?"
        );
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        assert_eq!(
            render("Hi [FirstName] [CustomerName] [", "Ana", "S", "e"),
            "Hi [FirstName] Ana ["
        );
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        assert_eq!(
            render("[CustomerName] at [SalonName]", "[SalonName]", "Glow", "e"),
            "[SalonName] at Glow"
        );
    }

    #[test]
    fn test_template_fallback() {
        assert_eq!(resolve_template(None), DEFAULT_TEMPLATE);
        assert_eq!(resolve_template(Some(&stored("   "))), DEFAULT_TEMPLATE);
        assert_eq!(
            resolve_template(Some(&stored("Happy [Event]!"))),
            "Happy [Event]!"
        );
    }

    #[tokio::test]
    async fn test_dispatch_reports_channel_failure() {
        let channel = RecordingChannel::new();
        channel.fail_for("+15550000000");
        let dispatcher = NotificationDispatcher::new(channel.clone());

        dispatcher.dispatch("+15551112222", "hello").await.unwrap();
        assert!(dispatcher.dispatch("+15550000000", "hello").await.is_err());
        assert_eq!(channel.sent().len(), 1);
    }
}
