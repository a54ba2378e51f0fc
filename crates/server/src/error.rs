//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::auth::AuthError;
use crate::services::customers::CustomerError;
use crate::store::RepositoryError;
use crate::validation::ValidationError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Registration, login or profile operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Customer directory operation failed.
    #[error("Customer error: {0}")]
    Customer(#[from] CustomerError),

    /// Submitted input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Missing, invalid or expired session token.
    #[error("Unauthorized")]
    Unauthorized,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::NotFound => StatusCode::NOT_FOUND,
                AuthError::Token(_)
                | AuthError::PasswordHash(_)
                | AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Customer(err) => match err {
                CustomerError::Validation(_) => StatusCode::BAD_REQUEST,
                CustomerError::NotFound => StatusCode::NOT_FOUND,
                CustomerError::Cipher(_) | CustomerError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message. Internal details never leave the server.
    fn public_message(&self) -> String {
        match self {
            Self::Auth(AuthError::Validation(e))
            | Self::Customer(CustomerError::Validation(e))
            | Self::Validation(e) => e.to_string(),
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Auth(AuthError::EmailTaken) => {
                "An account with this email already exists".to_string()
            }
            Self::Auth(AuthError::NotFound) => "Account not found".to_string(),
            Self::Customer(CustomerError::NotFound) => "Customer not found".to_string(),
            Self::Unauthorized => "Unauthorized".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenError;
    use crate::crypto::CipherError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(get_status(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AppError::Auth(AuthError::EmailTaken)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Customer(CustomerError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Validation(ValidationError::Required("name"))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Customer(CustomerError::Cipher(
                CipherError::AuthenticationFailed
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "customer 7 has no owner".to_string(),
        ));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Auth(AuthError::Token(TokenError::Unusable));
        assert_eq!(err.public_message(), "Internal server error");
    }
}
