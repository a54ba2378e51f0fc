//! Principal (salon owner) models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use glamdesk_core::{Email, PrincipalId};

use crate::validation::ValidProfile;

/// A registered salon owner as stored.
#[derive(Clone)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: Email,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub name: String,
    pub salon_name: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("salon_name", &self.salon_name)
            .finish_non_exhaustive()
    }
}

/// Insert payload for a new principal.
#[derive(Clone)]
pub struct NewPrincipal {
    pub email: Email,
    pub password_hash: String,
    pub profile: ValidProfile,
}

/// The public view of a principal; never carries the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: PrincipalId,
    pub email: Email,
    pub name: String,
    pub salon_name: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Principal> for Profile {
    fn from(p: Principal) -> Self {
        Self {
            id: p.id,
            email: p.email,
            name: p.name,
            salon_name: p.salon_name,
            phone: p.phone,
            address: p.address,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
