//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ENCRYPTION_KEY` - 64 hex characters (32 bytes) for customer field encryption
//! - `TWILIO_ACCOUNT_SID` - SMS provider account SID
//! - `TWILIO_AUTH_TOKEN` - SMS provider auth token
//! - `TWILIO_PHONE_NUMBER` - Sender number in E.164 form
//!
//! ## Optional
//! - `JWT_SECRET_KEY` - Session token signing secret (min 32 chars, high entropy).
//!   When unset the server still starts but cannot log anyone in.
//! - `GLAMDESK_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` connection string.
//!   When unset an in-memory store is used and nothing survives a restart.
//! - `GLAMDESK_HOST` - Bind address (default: 127.0.0.1)
//! - `GLAMDESK_PORT` - Listen port (default: 8080)
//! - `TWILIO_API_BASE` - SMS API base URL (default: <https://api.twilio.com>)
//! - `TWILIO_TIMEOUT_SECS` - Per-request SMS timeout in seconds (default: 10)
//! - `REMINDER_INTERVAL_SECS` - Seconds between reminder passes (default: 86400)
//! - `REMINDER_LOOKAHEAD_DAYS` - Days ahead to look for events (default: 7)
//! - `REMINDER_REPEAT_POLICY` - `once_per_occurrence` (default) or `every_tick`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::crypto::EncryptionKey;
use crate::reminders::{RepeatPolicy, ReminderSettings};

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
const DEFAULT_SMS_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
///
/// Implements `Debug` manually so the key and secrets never reach logs.
#[derive(Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` connection URL; `None` selects the in-memory store
    pub database_url: Option<SecretString>,
    pub host: IpAddr,
    pub port: u16,
    /// Customer field encryption key
    pub encryption_key: EncryptionKey,
    /// Session token signing secret; `None` disables login
    pub token_secret: Option<SecretString>,
    /// SMS delivery credentials
    pub sms: SmsConfig,
    /// Reminder scheduler cadence and policy
    pub reminders: ReminderSettings,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("encryption_key", &"[REDACTED]")
            .field("token_secret", &self.token_secret.as_ref().map(|_| "[REDACTED]"))
            .field("sms", &self.sms)
            .field("reminders", &self.reminders)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

/// Twilio-compatible SMS API configuration.
///
/// Implements `Debug` manually to redact the auth token.
#[derive(Clone)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    /// Sender phone number
    pub from_number: String,
    /// API base URL, overridable for tests and regional endpoints
    pub api_base: String,
    /// Upper bound on one provider request, connect to last byte
    pub timeout: Duration,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SmsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            account_sid: get_required_env("TWILIO_ACCOUNT_SID")?,
            auth_token: get_required_secret("TWILIO_AUTH_TOKEN")?,
            from_number: get_required_env("TWILIO_PHONE_NUMBER")?,
            api_base: get_env_or_default("TWILIO_API_BASE", DEFAULT_TWILIO_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            timeout: positive_secs("TWILIO_TIMEOUT_SECS")?.unwrap_or(DEFAULT_SMS_TIMEOUT),
        })
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, the
    /// encryption key does not decode to 32 bytes, or a configured token
    /// secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("GLAMDESK_DATABASE_URL");
        let host = get_env_or_default("GLAMDESK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("GLAMDESK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("GLAMDESK_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("GLAMDESK_PORT".to_string(), e.to_string()))?;

        let encryption_key = parse_encryption_key(&get_required_env("ENCRYPTION_KEY")?)?;
        let token_secret = parse_token_secret(get_optional_env("JWT_SECRET_KEY"))?;
        let sms = SmsConfig::from_env()?;
        let reminders = reminder_settings_from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            encryption_key,
            token_secret,
            sms,
            reminders,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn reminder_settings_from_env() -> Result<ReminderSettings, ConfigError> {
    let defaults = ReminderSettings::default();

    let interval = positive_secs("REMINDER_INTERVAL_SECS")?.unwrap_or(defaults.interval);

    let lookahead_days = match get_optional_env("REMINDER_LOOKAHEAD_DAYS") {
        Some(raw) => raw.parse::<u32>().map_err(|e| {
            ConfigError::InvalidEnvVar("REMINDER_LOOKAHEAD_DAYS".to_string(), e.to_string())
        })?,
        None => defaults.lookahead_days,
    };

    let repeat_policy = match get_optional_env("REMINDER_REPEAT_POLICY") {
        Some(raw) => raw
            .parse::<RepeatPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("REMINDER_REPEAT_POLICY".to_string(), e))?,
        None => defaults.repeat_policy,
    };

    Ok(ReminderSettings {
        interval,
        lookahead_days,
        repeat_policy,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Decode the field encryption key. Any failure here must stop startup.
fn parse_encryption_key(raw: &str) -> Result<EncryptionKey, ConfigError> {
    EncryptionKey::from_hex(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("ENCRYPTION_KEY".to_string(), e.to_string()))
}

/// Validate an optional token secret. Absent is allowed; weak is not.
fn parse_token_secret(raw: Option<String>) -> Result<Option<SecretString>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let secret = SecretString::from(raw);
    validate_token_secret(&secret, "JWT_SECRET_KEY")?;
    validate_secret_strength(secret.expose_secret(), "JWT_SECRET_KEY")?;
    Ok(Some(secret))
}

/// Get a required environment variable. Blank values count as missing.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    require(key, std::env::var(key).ok())
}

fn require(key: &str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Optional whole number of seconds that must be greater than zero.
fn positive_secs(key: &str) -> Result<Option<Duration>, ConfigError> {
    get_optional_env(key)
        .map(|raw| parse_positive_secs(key, &raw))
        .transpose()
}

fn parse_positive_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
