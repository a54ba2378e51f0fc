//! Cryptographic primitives guarding data at rest.
//!
//! - [`FieldCipher`] - AES-256-GCM encryption of individual PII fields
//! - [`PasswordVault`] - Argon2id password hashing and verification

mod field_cipher;
mod password;

pub use field_cipher::{CipherError, EncryptionKey, FieldCipher, KEY_LEN, KeyError, NONCE_LEN};
pub use password::{PasswordError, PasswordVault};
