//! Twilio-compatible SMS client.
//!
//! Sends messages with `POST {api_base}/2010-04-01/Accounts/{sid}/Messages.json`
//! using HTTP basic auth and a form body of `To`, `From` and `Body`.
//!
//! Every request is bounded by [`SmsConfig::timeout`]. A provider that
//! accepts the connection and never answers fails that one message with
//! [`DeliveryError::Request`].

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

use super::{DeliveryChannel, DeliveryError, mask_destination};
use crate::config::SmsConfig;

/// Error body returned by the provider on failure.
#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct SmsClient {
    client: Client,
    account_sid: String,
    auth_token: SecretString,
    from_number: String,
    api_base: String,
    timeout: Duration,
}

impl std::fmt::Debug for SmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsClient")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SmsClient {
    #[must_use]
    pub fn new(config: &SmsConfig) -> Self {
        Self {
            client: Client::new(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            api_base: config.api_base.clone(),
            timeout: config.timeout,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

impl DeliveryChannel for SmsClient {
    #[instrument(skip(self, destination, body), fields(to = %mask_destination(destination)))]
    async fn send(&self, destination: &str, body: &str) -> Result<(), DeliveryError> {
        if destination.trim().is_empty() {
            return Err(DeliveryError::InvalidDestination);
        }

        let params = [
            ("To", destination),
            ("From", self.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(timeout = ?self.timeout, "SMS provider did not answer in time");
                }
                DeliveryError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ProviderError>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            error!(status = status.as_u16(), error = %message, "SMS provider rejected message");
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!("SMS accepted by provider");
        Ok(())
    }
}
