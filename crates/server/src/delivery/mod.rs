//! Outbound notification delivery.
//!
//! - [`SmsClient`] - Twilio-compatible REST client used in production
//! - [`RecordingChannel`] - keeps every message in memory; used in tests and
//!   when exercising the scheduler without a provider

mod recording;
mod sms;

use std::future::Future;

use thiserror::Error;

pub use recording::{RecordingChannel, SentMessage};
pub use sms::SmsClient;

/// Errors from a delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request never got a response.
    #[error("delivery request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The destination cannot receive messages.
    #[error("invalid destination")]
    InvalidDestination,
}

/// Accepts a destination and a message body and attempts transmission.
///
/// At least one attempt is made per call; there is no retry or
/// exactly-once guarantee.
pub trait DeliveryChannel: Send + Sync + 'static {
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the message was not accepted.
    fn send(
        &self,
        destination: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Mask all but the last four characters of a destination for logging.
#[must_use]
pub fn mask_destination(destination: &str) -> String {
    let chars: Vec<char> = destination.chars().collect();
    let keep = chars.len().min(4);
    let hidden = chars.len() - keep;
    let tail: String = chars.iter().skip(hidden).collect();
    format!("{}{tail}", "*".repeat(hidden))
}
