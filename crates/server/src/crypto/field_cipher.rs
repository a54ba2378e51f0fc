//! Authenticated encryption for individual string fields.
//!
//! Every call to [`FieldCipher::encrypt`] draws a fresh 96-bit nonce from the
//! OS RNG and prepends it to the AES-GCM output, so the stored layout is
//! `nonce(12) ‖ ciphertext ‖ tag(16)`. Encrypting the same value twice yields
//! different bytes; equality searches over encrypted columns are impossible.

use aes_gcm::{
    Aes256Gcm, Key, KeyInit, Nonce,
    aead::{Aead, AeadCore, OsRng},
};
use glamdesk_core::EncryptedField;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Errors while decoding the configured encryption key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("encryption key is not valid hex: {0}")]
    InvalidHex(String),
    #[error("encryption key must be {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Errors from encrypting or decrypting a field.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CipherError {
    /// Input too short to contain a nonce, or authenticated plaintext that
    /// is not UTF-8.
    #[error("ciphertext is corrupt")]
    CorruptCiphertext,
    /// The GCM tag did not verify: wrong key or tampered bytes.
    #[error("ciphertext failed authentication")]
    AuthenticationFailed,
    #[error("encryption failed")]
    EncryptionFailed,
}

/// A 32-byte AES-256 key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Decode a key from its 64-character hex form.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the input is not hex or does not decode to
    /// exactly 32 bytes.
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let mut bytes =
            hex::decode(encoded.trim()).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        let result = <[u8; KEY_LEN]>::try_from(bytes.as_slice())
            .map(Self)
            .map_err(|_| KeyError::WrongLength {
                expected: KEY_LEN,
                actual: bytes.len(),
            });
        bytes.zeroize();
        result
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Encrypts and decrypts PII fields with a single process-wide key.
///
/// Immutable after construction and safe to share across tasks.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    #[must_use]
    pub fn new(key: &EncryptionKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0)),
        }
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::EncryptionFailed`] only if the AEAD rejects the
    /// input length, which does not happen for field-sized values.
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedField, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(EncryptedField::from_bytes(out))
    }

    /// Decrypt a field produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// - [`CipherError::CorruptCiphertext`] if the input is shorter than a nonce
    ///   or the authenticated plaintext is not UTF-8
    /// - [`CipherError::AuthenticationFailed`] if the tag does not verify
    pub fn decrypt(&self, field: &EncryptedField) -> Result<String, CipherError> {
        let (nonce, sealed) = field
            .as_bytes()
            .split_at_checked(NONCE_LEN)
            .ok_or(CipherError::CorruptCiphertext)?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::AuthenticationFailed)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::CorruptCiphertext)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const TEST_KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn cipher() -> FieldCipher {
        FieldCipher::new(&EncryptionKey::from_hex(TEST_KEY_HEX).unwrap())
    }

    #[test]
    fn test_round_trip() {
        let cipher = cipher();
        for value in ["", "+15551234567", "a\0b", "Zoë 🎂 誕生日"] {
            let field = cipher.encrypt(value).unwrap();
            assert_eq!(cipher.decrypt(&field).unwrap(), value);
        }
    }

    #[test]
    fn test_empty_plaintext_layout() {
        let field = cipher().encrypt("").unwrap();
        assert_eq!(field.len(), NONCE_LEN + 16);
    }

    #[test]
    fn test_encrypt_is_probabilistic() {
        let cipher = cipher();
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
        assert_ne!(a.as_bytes()[..NONCE_LEN], b.as_bytes()[..NONCE_LEN]);
    }

    #[test]
    fn test_single_bit_flip_fails_authentication() {
        let cipher = cipher();
        let field = cipher.encrypt("jane@example.com").unwrap();
        let len = field.len();

        // First nonce byte, first body byte, last tag byte.
        for index in [0, NONCE_LEN, len - 1] {
            let mut bytes = field.as_bytes().to_vec();
            bytes[index] ^= 0x01;
            let tampered = EncryptedField::from_bytes(bytes);
            assert_eq!(
                cipher.decrypt(&tampered),
                Err(CipherError::AuthenticationFailed),
                "flip at byte {index}"
            );
        }
    }

    #[test]
    fn test_truncated_input_is_corrupt() {
        let cipher = cipher();
        for len in [0, 1, NONCE_LEN - 1] {
            let field = EncryptedField::from_bytes(vec![0u8; len]);
            assert_eq!(cipher.decrypt(&field), Err(CipherError::CorruptCiphertext));
        }
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let field = cipher().encrypt("secret").unwrap();
        let other = FieldCipher::new(&EncryptionKey::from_bytes([7u8; KEY_LEN]));
        assert_eq!(other.decrypt(&field), Err(CipherError::AuthenticationFailed));
    }

    #[test]
    fn test_non_utf8_plaintext_is_corrupt() {
        let cipher = cipher();
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher.cipher.encrypt(&nonce, &[0xffu8, 0xfe][..]).unwrap();
        let mut bytes = nonce.to_vec();
        bytes.extend_from_slice(&sealed);

        let field = EncryptedField::from_bytes(bytes);
        assert_eq!(cipher.decrypt(&field), Err(CipherError::CorruptCiphertext));
    }

    #[test]
    fn test_key_from_hex_rejects_bad_input() {
        assert!(matches!(
            EncryptionKey::from_hex("not hex"),
            Err(KeyError::InvalidHex(_))
        ));
        assert_eq!(
            EncryptionKey::from_hex("abcd").unwrap_err(),
            KeyError::WrongLength {
                expected: KEY_LEN,
                actual: 2
            }
        );
        assert!(EncryptionKey::from_hex(&format!(" {TEST_KEY_HEX}\n")).is_ok());
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = EncryptionKey::from_hex(TEST_KEY_HEX).unwrap();
        assert_eq!(format!("{key:?}"), "EncryptionKey([REDACTED])");
    }
}
