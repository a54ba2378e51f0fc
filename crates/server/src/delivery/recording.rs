//! In-memory delivery channel.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use super::{DeliveryChannel, DeliveryError};

/// A message captured by [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: String,
    pub body: String,
}

/// Records every accepted message. Destinations registered with
/// [`RecordingChannel::fail_for`] are rejected instead.
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every future send to `destination`.
    pub fn fail_for(&self, destination: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(destination.into());
    }

    /// Messages accepted so far, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DeliveryChannel for RecordingChannel {
    async fn send(&self, destination: &str, body: &str) -> Result<(), DeliveryError> {
        let rejected = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(destination);
        if rejected {
            return Err(DeliveryError::Rejected {
                status: 400,
                message: "destination rejected".to_string(),
            });
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                destination: destination.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}
