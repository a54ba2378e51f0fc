//! Authentication service.
//!
//! Registration, password login and the owner's profile.

mod error;

pub use error::AuthError;

use serde::Deserialize;
use tracing::{info, instrument};

use glamdesk_core::{Email, PrincipalId};

use crate::auth::{IssuedToken, TokenService};
use crate::crypto::PasswordVault;
use crate::models::{NewPrincipal, Profile};
use crate::store::PrincipalStore;
use crate::validation::{ProfileForm, RegistrationForm, ValidationError};

/// Login form.
#[derive(Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Authentication service.
pub struct AuthService<'a, S> {
    store: &'a S,
    vault: &'a PasswordVault,
    tokens: &'a TokenService,
}

impl<'a, S: PrincipalStore + Sync> AuthService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, vault: &'a PasswordVault, tokens: &'a TokenService) -> Self {
        Self {
            store,
            vault,
            tokens,
        }
    }

    /// Register a new salon owner.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a rejected field.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    #[instrument(skip_all)]
    pub async fn register(&self, form: RegistrationForm) -> Result<Profile, AuthError> {
        let registration = form.validate()?;
        let password_hash = self.vault.hash(&registration.password)?;

        let principal = self
            .store
            .insert_principal(NewPrincipal {
                email: registration.email,
                password_hash,
                profile: registration.profile,
            })
            .await?;

        info!(principal_id = %principal.id, "Principal registered");
        Ok(principal.into())
    }

    /// Check credentials and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if either field is blank or the email
    /// is malformed.
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password.
    /// Returns `AuthError::Token` if no signing secret is configured.
    #[instrument(skip_all)]
    pub async fn login(&self, form: LoginForm) -> Result<IssuedToken, AuthError> {
        if form.email.trim().is_empty() {
            return Err(ValidationError::Required("email").into());
        }
        if form.password.is_empty() {
            return Err(ValidationError::Required("password").into());
        }
        let email = Email::parse(&form.email).map_err(ValidationError::from)?;

        let principal = self
            .store
            .find_principal_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.vault.verify(&form.password, &principal.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(principal.id)?;
        info!(principal_id = %principal.id, "Principal logged in");
        Ok(token)
    }

    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the principal no longer exists.
    pub async fn profile(&self, id: PrincipalId) -> Result<Profile, AuthError> {
        Ok(self.store.get_principal(id).await?.into())
    }

    /// Replace the profile fields, keeping email and credential.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a rejected field.
    /// Returns `AuthError::NotFound` if the principal no longer exists.
    #[instrument(skip(self, form), fields(principal_id = %id))]
    pub async fn update_profile(
        &self,
        id: PrincipalId,
        form: ProfileForm,
    ) -> Result<Profile, AuthError> {
        let profile = form.validate()?;
        let principal = self.store.update_profile(id, profile).await?;
        info!("Profile updated");
        Ok(principal.into())
    }
}
