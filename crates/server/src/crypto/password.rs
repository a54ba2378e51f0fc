//! Argon2id password hashing.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hashes and verifies principal passwords.
///
/// Hashes are PHC strings that embed salt and cost parameters, so a vault
/// built with different parameters still verifies older hashes.
#[derive(Debug, Clone)]
pub struct PasswordVault {
    argon2: Argon2<'static>,
}

impl Default for PasswordVault {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordVault {
    /// Argon2id with the crate's recommended default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Argon2id with explicit cost parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Hash` if Argon2 rejects the input.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Check `password` against a stored PHC string.
    ///
    /// Returns `false` for a mismatch and for a hash that does not parse.
    #[must_use]
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fast_vault() -> PasswordVault {
        PasswordVault::with_params(Params::new(256, 1, 1, None).unwrap())
    }

    #[test]
    fn test_hash_is_salted() {
        let vault = fast_vault();
        let a = vault.hash("Abc12345!").unwrap();
        let b = vault.hash("Abc12345!").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(vault.verify("Abc12345!", &a));
        assert!(vault.verify("Abc12345!", &b));
        assert!(!vault.verify("wrong", &a));
    }

    #[test]
    fn test_verify_uses_embedded_params() {
        let hash = fast_vault().hash("Abc12345!").unwrap();
        assert!(PasswordVault::new().verify("Abc12345!", &hash));
    }

    #[test]
    fn test_verify_garbage_hash_is_false() {
        let vault = fast_vault();
        assert!(!vault.verify("Abc12345!", ""));
        assert!(!vault.verify("Abc12345!", "$2a$10$notargon"));
    }
}
