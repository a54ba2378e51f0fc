//! Customer models.
//!
//! [`CustomerRecord`] is what the store holds: phone and email are
//! [`EncryptedField`]s. [`Customer`] is the decrypted view returned to the
//! owner. Nothing outside the customer directory converts one to the other.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use glamdesk_core::{CustomerId, EncryptedField, PrincipalId};

/// A customer row as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub owner_id: PrincipalId,
    /// Stored in plaintext so it can be searched.
    pub name: String,
    pub phone: EncryptedField,
    pub email: EncryptedField,
    /// Plain dates: reminder matching queries on month and day.
    pub birthday: Option<NaiveDate>,
    pub anniversary: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert/update payload, already encrypted.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub phone: EncryptedField,
    pub email: EncryptedField,
    pub birthday: Option<NaiveDate>,
    pub anniversary: Option<NaiveDate>,
}

/// A customer with PII decrypted for its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub birthday: Option<NaiveDate>,
    pub anniversary: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
