//! Owner-scoped customer records.
//!
//! Phone and email are encrypted with the [`FieldCipher`] before they reach
//! the store and decrypted on the way out. How a decrypt failure is handled
//! depends on the operation:
//!
//! | operation | policy |
//! |-----------|--------|
//! | `get` | [`DecryptPolicy::FailFast`] |
//! | `list`, `search` | [`DecryptPolicy::DegradeAndMark`] |

mod error;

pub use error::CustomerError;

use tracing::{info, instrument, warn};

use glamdesk_core::{CustomerId, EncryptedField, PrincipalId};

use crate::crypto::{CipherError, FieldCipher};
use crate::models::{Customer, CustomerRecord, NewCustomer};
use crate::store::CustomerStore;
use crate::validation::{CustomerForm, ValidCustomer};

/// Shown in place of a field that failed to decrypt.
pub const DECRYPTION_FAILED: &str = "[DECRYPTION FAILED]";

/// What to do when a stored field fails to decrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptPolicy {
    /// Return the error.
    FailFast,
    /// Replace the field with [`DECRYPTION_FAILED`] and keep going.
    DegradeAndMark,
}

pub struct CustomerDirectory<'a, S> {
    store: &'a S,
    cipher: &'a FieldCipher,
}

impl<'a, S: CustomerStore + Sync> CustomerDirectory<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, cipher: &'a FieldCipher) -> Self {
        Self { store, cipher }
    }

    /// # Errors
    ///
    /// Returns `CustomerError::Validation` for a rejected field.
    #[instrument(skip(self, form), fields(owner_id = %owner))]
    pub async fn create(
        &self,
        owner: PrincipalId,
        form: CustomerForm,
    ) -> Result<Customer, CustomerError> {
        let valid = form.validate()?;
        let record = self
            .store
            .insert_customer(owner, self.seal(&valid)?)
            .await?;
        info!(customer_id = %record.id, "Customer created");
        Ok(echo(record, valid))
    }

    /// # Errors
    ///
    /// Returns `CustomerError::NotFound` if the customer does not exist or
    /// belongs to another owner, and `CustomerError::Cipher` if a field
    /// fails to decrypt.
    pub async fn get(&self, owner: PrincipalId, id: CustomerId) -> Result<Customer, CustomerError> {
        let record = self.store.get_customer(owner, id).await?;
        Ok(self.reveal(record, DecryptPolicy::FailFast)?)
    }

    /// All of the owner's customers, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Repository` if the store query fails.
    pub async fn list(&self, owner: PrincipalId) -> Result<Vec<Customer>, CustomerError> {
        let records = self.store.list_customers(owner).await?;
        self.reveal_all(records)
    }

    /// Case-insensitive name search. A blank query lists everything.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Repository` if the store query fails.
    pub async fn search(
        &self,
        owner: PrincipalId,
        query: &str,
    ) -> Result<Vec<Customer>, CustomerError> {
        let query = query.trim();
        if query.is_empty() {
            return self.list(owner).await;
        }
        let records = self.store.search_customers_by_name(owner, query).await?;
        self.reveal_all(records)
    }

    /// # Errors
    ///
    /// Returns `CustomerError::Validation` for a rejected field and
    /// `CustomerError::NotFound` for a missing or foreign customer.
    #[instrument(skip(self, form), fields(owner_id = %owner, customer_id = %id))]
    pub async fn update(
        &self,
        owner: PrincipalId,
        id: CustomerId,
        form: CustomerForm,
    ) -> Result<Customer, CustomerError> {
        let valid = form.validate()?;
        let record = self
            .store
            .update_customer(owner, id, self.seal(&valid)?)
            .await?;
        info!("Customer updated");
        Ok(echo(record, valid))
    }

    /// # Errors
    ///
    /// Returns `CustomerError::NotFound` for a missing or foreign customer.
    #[instrument(skip(self), fields(owner_id = %owner, customer_id = %id))]
    pub async fn delete(&self, owner: PrincipalId, id: CustomerId) -> Result<(), CustomerError> {
        self.store.delete_customer(owner, id).await?;
        info!("Customer deleted");
        Ok(())
    }

    fn seal(&self, valid: &ValidCustomer) -> Result<NewCustomer, CipherError> {
        let email = valid.email.as_ref().map_or("", |e| e.as_str());
        Ok(NewCustomer {
            name: valid.name.clone(),
            phone: self.cipher.encrypt(&valid.phone)?,
            email: self.cipher.encrypt(email)?,
            birthday: valid.birthday,
            anniversary: valid.anniversary,
        })
    }

    fn reveal_all(&self, records: Vec<CustomerRecord>) -> Result<Vec<Customer>, CustomerError> {
        records
            .into_iter()
            .map(|r| {
                self.reveal(r, DecryptPolicy::DegradeAndMark)
                    .map_err(CustomerError::from)
            })
            .collect()
    }

    /// Decrypt a stored record under `policy`.
    ///
    /// # Errors
    ///
    /// Only under [`DecryptPolicy::FailFast`].
    pub fn reveal(
        &self,
        record: CustomerRecord,
        policy: DecryptPolicy,
    ) -> Result<Customer, CipherError> {
        let phone = self.open(record.id, "phone", &record.phone, policy)?;
        let email = self.open(record.id, "email", &record.email, policy)?;
        Ok(Customer {
            id: record.id,
            name: record.name,
            phone,
            email,
            birthday: record.birthday,
            anniversary: record.anniversary,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    fn open(
        &self,
        id: CustomerId,
        field: &'static str,
        value: &EncryptedField,
        policy: DecryptPolicy,
    ) -> Result<String, CipherError> {
        match (self.cipher.decrypt(value), policy) {
            (Ok(plain), _) => Ok(plain),
            (Err(e), DecryptPolicy::FailFast) => Err(e),
            (Err(e), DecryptPolicy::DegradeAndMark) => {
                warn!(customer_id = %id, field, error = %e, "Customer field failed to decrypt");
                Ok(DECRYPTION_FAILED.to_string())
            }
        }
    }
}

/// The response for a write echoes the validated input rather than
/// decrypting what was just stored.
fn echo(record: CustomerRecord, valid: ValidCustomer) -> Customer {
    Customer {
        id: record.id,
        name: valid.name,
        phone: valid.phone,
        email: valid.email.map(String::from).unwrap_or_default(),
        birthday: valid.birthday,
        anniversary: valid.anniversary,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}
