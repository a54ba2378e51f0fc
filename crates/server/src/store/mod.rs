//! Record store contract and its backends.
//!
//! # Backends
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx; schema in `crates/server/migrations/`
//! - [`MemoryStore`] - process-local maps, used when no database URL is
//!   configured and throughout the tests
//!
//! Personally identifying customer fields cross this boundary only as
//! [`EncryptedField`](glamdesk_core::EncryptedField). Every customer and
//! template operation is scoped by owner except the reminder scan, which
//! deliberately spans all owners.
//!
//! # Migrations
//!
//! ```bash
//! cargo run -p glamdesk-cli -- migrate
//! ```

mod memory;
mod postgres;

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use glamdesk_core::{CustomerId, Email, EventType, MonthDay, PrincipalId};

use crate::models::{
    CustomerRecord, NewCustomer, NewPrincipal, Principal, ReminderCandidate, ReminderTemplate,
};
use crate::validation::ValidProfile;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found (or belongs to another owner).
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Principal lookup and registration.
pub trait PrincipalStore {
    /// # Errors
    ///
    /// `Conflict` if the email is already registered.
    fn insert_principal(
        &self,
        principal: NewPrincipal,
    ) -> impl Future<Output = Result<Principal, RepositoryError>> + Send;

    fn find_principal_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<Principal>, RepositoryError>> + Send;

    /// # Errors
    ///
    /// `NotFound` if no principal has this id.
    fn get_principal(
        &self,
        id: PrincipalId,
    ) -> impl Future<Output = Result<Principal, RepositoryError>> + Send;

    /// # Errors
    ///
    /// `NotFound` if no principal has this id.
    fn update_profile(
        &self,
        id: PrincipalId,
        profile: ValidProfile,
    ) -> impl Future<Output = Result<Principal, RepositoryError>> + Send;
}

/// Owner-scoped customer records, plus the cross-owner reminder scan.
pub trait CustomerStore {
    fn insert_customer(
        &self,
        owner: PrincipalId,
        customer: NewCustomer,
    ) -> impl Future<Output = Result<CustomerRecord, RepositoryError>> + Send;

    /// # Errors
    ///
    /// `NotFound` if the customer does not exist or belongs to another owner.
    fn get_customer(
        &self,
        owner: PrincipalId,
        id: CustomerId,
    ) -> impl Future<Output = Result<CustomerRecord, RepositoryError>> + Send;

    /// All of an owner's customers, ordered by name.
    fn list_customers(
        &self,
        owner: PrincipalId,
    ) -> impl Future<Output = Result<Vec<CustomerRecord>, RepositoryError>> + Send;

    /// Case-insensitive substring match on the plaintext name.
    fn search_customers_by_name(
        &self,
        owner: PrincipalId,
        query: &str,
    ) -> impl Future<Output = Result<Vec<CustomerRecord>, RepositoryError>> + Send;

    /// # Errors
    ///
    /// `NotFound` if the customer does not exist or belongs to another owner.
    fn update_customer(
        &self,
        owner: PrincipalId,
        id: CustomerId,
        customer: NewCustomer,
    ) -> impl Future<Output = Result<CustomerRecord, RepositoryError>> + Send;

    /// # Errors
    ///
    /// `NotFound` if the customer does not exist or belongs to another owner.
    fn delete_customer(
        &self,
        owner: PrincipalId,
        id: CustomerId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Customers of every owner whose birthday or anniversary falls on
    /// `month_day`, joined with their salon name.
    fn find_customers_matching_month_day(
        &self,
        month_day: MonthDay,
    ) -> impl Future<Output = Result<Vec<ReminderCandidate>, RepositoryError>> + Send;
}

/// Per-owner reminder templates.
pub trait TemplateStore {
    fn get_template(
        &self,
        owner: PrincipalId,
        event_type: EventType,
    ) -> impl Future<Output = Result<Option<ReminderTemplate>, RepositoryError>> + Send;

    /// Insert or replace the template for `(owner, event_type)`.
    fn upsert_template(
        &self,
        owner: PrincipalId,
        event_type: EventType,
        template: String,
    ) -> impl Future<Output = Result<ReminderTemplate, RepositoryError>> + Send;

    fn list_templates(
        &self,
        owner: PrincipalId,
    ) -> impl Future<Output = Result<Vec<ReminderTemplate>, RepositoryError>> + Send;
}

/// Records which event occurrence each customer was last notified about.
pub trait NotificationLedger {
    fn last_notified(
        &self,
        customer: CustomerId,
        event_type: EventType,
    ) -> impl Future<Output = Result<Option<NaiveDate>, RepositoryError>> + Send;

    fn record_notified(
        &self,
        customer: CustomerId,
        event_type: EventType,
        occurrence: NaiveDate,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Everything the server needs from a backend.
pub trait Store:
    PrincipalStore + CustomerStore + TemplateStore + NotificationLedger + Clone + Send + Sync + 'static
{
}

impl<T> Store for T where
    T: PrincipalStore
        + CustomerStore
        + TemplateStore
        + NotificationLedger
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
