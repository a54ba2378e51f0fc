//! Customer directory error types.

use thiserror::Error;

use crate::crypto::CipherError;
use crate::store::RepositoryError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum CustomerError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Missing, or owned by someone else.
    #[error("customer not found")]
    NotFound,

    /// A stored field could not be encrypted or decrypted.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CustomerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}
