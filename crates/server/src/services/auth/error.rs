//! Authentication error types.

use thiserror::Error;

use crate::auth::TokenError;
use crate::crypto::PasswordError;
use crate::store::RepositoryError;
use crate::validation::ValidationError;

/// Errors that can occur during registration, login and profile updates.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Submitted fields failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Unknown email or wrong password. The two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("email already registered")]
    EmailTaken,

    /// Principal no longer exists.
    #[error("principal not found")]
    NotFound,

    /// Session token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Password hashing error.
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => Self::EmailTaken,
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}
