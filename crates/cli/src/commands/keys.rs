//! Key generation and password hashing.

use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroize;

use glamdesk_server::crypto::{KEY_LEN, PasswordError, PasswordVault};
use glamdesk_server::validation::{ValidationError, validate_password};

#[derive(Debug, Error)]
pub enum KeyCommandError {
    #[error("password rejected: {0}")]
    Policy(#[from] ValidationError),

    #[error(transparent)]
    Hash(#[from] PasswordError),
}

/// A fresh random key, hex encoded, suitable for `ENCRYPTION_KEY`.
#[must_use]
pub fn generate_encryption_key() -> String {
    let mut key = [0u8; KEY_LEN];
    rand::rng().fill_bytes(&mut key);
    let encoded = hex::encode(key);
    key.zeroize();
    encoded
}

/// Check `password` against the policy, then hash it.
///
/// # Errors
///
/// Returns `KeyCommandError::Policy` if the password is too weak.
pub fn hash_password(password: &str) -> Result<String, KeyCommandError> {
    validate_password(password)?;
    Ok(PasswordVault::new().hash(password)?)
}
