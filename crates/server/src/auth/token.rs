//! HMAC-SHA256 signed session tokens.
//!
//! Tokens use the compact JWS layout
//! `base64url(header).base64url(claims).base64url(signature)` with header
//! `{"alg":"HS256","typ":"JWT"}` and claims `{sub, iat, exp}` in Unix seconds,
//! so any standard JWT library can inspect them. Nothing is persisted: a
//! token is valid iff its signature verifies and `now < exp`. There is no
//! revocation list; logout only discards the client's copy.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use glamdesk_core::PrincipalId;

/// Lifetime of every issued token (24 hours).
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

const ALGORITHM: &str = "HS256";

type HmacSha256 = Hmac<Sha256>;

/// Why a token could not be issued or was rejected.
///
/// Callers at the HTTP boundary collapse every variant into a single
/// "unauthenticated" response.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// No signing secret is configured.
    #[error("token service has no signing secret")]
    Unusable,
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
}

/// A freshly issued token and the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub principal_id: PrincipalId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Claims recovered from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClaims {
    pub principal_id: PrincipalId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies session tokens with a process-wide secret.
///
/// Built with `None` the service is disabled: issuing fails with
/// [`TokenError::Unusable`] and every verification is rejected.
#[derive(Clone)]
pub struct TokenService {
    secret: Option<SecretString>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TokenService {
    #[must_use]
    pub const fn new(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    /// Whether a signing secret is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Issue a token for `principal_id`, valid for 24 hours from now.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Unusable`] if no secret is configured.
    pub fn issue(&self, principal_id: PrincipalId) -> Result<IssuedToken, TokenError> {
        self.issue_at(principal_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Unusable`] if no secret is configured.
    pub fn issue_at(
        &self,
        principal_id: PrincipalId,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let mac = self.mac()?;

        // Sub-second precision is not representable in the claims.
        let iat = now.timestamp();
        let exp = iat + TOKEN_TTL_SECS;

        let header = encode_segment(&Header {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        })?;
        let claims = encode_segment(&Claims {
            sub: principal_id.to_string(),
            iat,
            exp,
        })?;

        let signing_input = format!("{header}.{claims}");
        let signature = URL_SAFE_NO_PAD.encode(sign(mac, &signing_input));

        Ok(IssuedToken {
            token: format!("{signing_input}.{signature}"),
            principal_id,
            issued_at: timestamp(iat)?,
            expires_at: timestamp(exp)?,
        })
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] describing why the token was rejected.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// The signature is checked in constant time before any claim is trusted.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] describing why the token was rejected.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let mut mac = self.mac()?;

        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let parsed_header: Header = decode_segment(header)?;
        if parsed_header.alg != ALGORITHM {
            return Err(TokenError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims = decode_segment(claims)?;
        if claims.exp - claims.iat != TOKEN_TTL_SECS {
            return Err(TokenError::Malformed);
        }
        let principal_id = claims
            .sub
            .parse::<PrincipalId>()
            .map_err(|_| TokenError::Malformed)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(SessionClaims {
            principal_id,
            issued_at: timestamp(claims.iat)?,
            expires_at: timestamp(claims.exp)?,
        })
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        let secret = self.secret.as_ref().ok_or(TokenError::Unusable)?;
        HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Unusable)
    }
}

fn sign(mut mac: HmacSha256, signing_input: &str) -> Vec<u8> {
    mac.update(signing_input.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|_| TokenError::Malformed)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(secs, 0).ok_or(TokenError::Malformed)
}
