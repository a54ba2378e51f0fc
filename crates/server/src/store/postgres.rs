//! `PostgreSQL` store.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate builds
//! without a live database; row structs are mapped into domain models with
//! `TryFrom`, surfacing unparseable columns as `DataCorruption`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use glamdesk_core::{CustomerId, Email, EncryptedField, EventType, MonthDay, PrincipalId};

use super::{
    CustomerStore, NotificationLedger, PrincipalStore, RepositoryError, TemplateStore,
};
use crate::models::{
    CustomerRecord, NewCustomer, NewPrincipal, Principal, ReminderCandidate, ReminderTemplate,
};
use crate::validation::ValidProfile;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PrincipalRow {
    id: i32,
    email: String,
    password_hash: String,
    name: String,
    salon_name: String,
    phone: String,
    address: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = RepositoryError;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: PrincipalId::new(row.id),
            email,
            password_hash: row.password_hash,
            name: row.name,
            salon_name: row.salon_name,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    owner_id: i32,
    name: String,
    phone: Vec<u8>,
    email: Vec<u8>,
    birthday: Option<NaiveDate>,
    anniversary: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for CustomerRecord {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            owner_id: PrincipalId::new(row.owner_id),
            name: row.name,
            phone: EncryptedField::from_bytes(row.phone),
            email: EncryptedField::from_bytes(row.email),
            birthday: row.birthday,
            anniversary: row.anniversary,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    owner_id: i32,
    event_type: String,
    template: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for ReminderTemplate {
    type Error = RepositoryError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let event_type = row.event_type.parse::<EventType>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid event type in database: {e}"))
        })?;

        Ok(Self {
            owner_id: PrincipalId::new(row.owner_id),
            event_type,
            template: row.template,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CandidateRow {
    owner_id: i32,
    customer_id: i32,
    customer_name: String,
    phone: Vec<u8>,
    salon_name: String,
    birthday: Option<NaiveDate>,
    anniversary: Option<NaiveDate>,
}

impl From<CandidateRow> for ReminderCandidate {
    fn from(row: CandidateRow) -> Self {
        Self {
            owner_id: PrincipalId::new(row.owner_id),
            customer_id: CustomerId::new(row.customer_id),
            customer_name: row.customer_name,
            phone: EncryptedField::from_bytes(row.phone),
            salon_name: row.salon_name,
            birthday: row.birthday,
            anniversary: row.anniversary,
        }
    }
}

const PRINCIPAL_COLUMNS: &str =
    "id, email, password_hash, name, salon_name, phone, address, created_at, updated_at";

const CUSTOMER_COLUMNS: &str =
    "id, owner_id, name, phone, email, birthday, anniversary, created_at, updated_at";

/// Escape `LIKE` metacharacters so a search term matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl PrincipalStore for PgStore {
    async fn insert_principal(&self, new: NewPrincipal) -> Result<Principal, RepositoryError> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            r"
            INSERT INTO principal (email, password_hash, name, salon_name, phone, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRINCIPAL_COLUMNS}
            "
        ))
        .bind(new.email.as_str())
        .bind(&new.password_hash)
        .bind(&new.profile.name)
        .bind(&new.profile.salon_name)
        .bind(&new.profile.phone)
        .bind(&new.profile.address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already registered".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    async fn find_principal_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Principal>, RepositoryError> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {PRINCIPAL_COLUMNS} FROM principal WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_principal(&self, id: PrincipalId) -> Result<Principal, RepositoryError> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {PRINCIPAL_COLUMNS} FROM principal WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn update_profile(
        &self,
        id: PrincipalId,
        profile: ValidProfile,
    ) -> Result<Principal, RepositoryError> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            r"
            UPDATE principal
            SET name = $2, salon_name = $3, phone = $4, address = $5, updated_at = now()
            WHERE id = $1
            RETURNING {PRINCIPAL_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(&profile.name)
        .bind(&profile.salon_name)
        .bind(&profile.phone)
        .bind(&profile.address)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}

impl CustomerStore for PgStore {
    async fn insert_customer(
        &self,
        owner: PrincipalId,
        customer: NewCustomer,
    ) -> Result<CustomerRecord, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            INSERT INTO customer (owner_id, name, phone, email, birthday, anniversary)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(owner.as_i32())
        .bind(&customer.name)
        .bind(customer.phone.as_bytes())
        .bind(customer.email.as_bytes())
        .bind(customer.birthday)
        .bind(customer.anniversary)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_customer(
        &self,
        owner: PrincipalId,
        id: CustomerId,
    ) -> Result<CustomerRecord, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn list_customers(
        &self,
        owner: PrincipalId,
    ) -> Result<Vec<CustomerRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE owner_id = $1 ORDER BY lower(name), id"
        ))
        .bind(owner.as_i32())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_customers_by_name(
        &self,
        owner: PrincipalId,
        query: &str,
    ) -> Result<Vec<CustomerRecord>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            SELECT {CUSTOMER_COLUMNS} FROM customer
            WHERE owner_id = $1 AND name ILIKE $2
            ORDER BY lower(name), id
            "
        ))
        .bind(owner.as_i32())
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_customer(
        &self,
        owner: PrincipalId,
        id: CustomerId,
        customer: NewCustomer,
    ) -> Result<CustomerRecord, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            UPDATE customer
            SET name = $3, phone = $4, email = $5, birthday = $6, anniversary = $7,
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .bind(&customer.name)
        .bind(customer.phone.as_bytes())
        .bind(customer.email.as_bytes())
        .bind(customer.birthday)
        .bind(customer.anniversary)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_customer(
        &self,
        owner: PrincipalId,
        id: CustomerId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = $1 AND owner_id = $2")
            .bind(id.as_i32())
            .bind(owner.as_i32())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_customers_matching_month_day(
        &self,
        month_day: MonthDay,
    ) -> Result<Vec<ReminderCandidate>, RepositoryError> {
        let month = i32::try_from(month_day.month())
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let day = i32::try_from(month_day.day())
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        let rows = sqlx::query_as::<_, CandidateRow>(
            r"
            SELECT c.owner_id, c.id AS customer_id, c.name AS customer_name, c.phone,
                   p.salon_name, c.birthday, c.anniversary
            FROM customer c
            JOIN principal p ON p.id = c.owner_id
            WHERE (EXTRACT(MONTH FROM c.birthday) = $1::int
                   AND EXTRACT(DAY FROM c.birthday) = $2::int)
               OR (EXTRACT(MONTH FROM c.anniversary) = $1::int
                   AND EXTRACT(DAY FROM c.anniversary) = $2::int)
            ORDER BY c.owner_id, c.id
            ",
        )
        .bind(month)
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl TemplateStore for PgStore {
    async fn get_template(
        &self,
        owner: PrincipalId,
        event_type: EventType,
    ) -> Result<Option<ReminderTemplate>, RepositoryError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r"
            SELECT owner_id, event_type, template, updated_at
            FROM reminder_template
            WHERE owner_id = $1 AND event_type = $2
            ",
        )
        .bind(owner.as_i32())
        .bind(event_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn upsert_template(
        &self,
        owner: PrincipalId,
        event_type: EventType,
        template: String,
    ) -> Result<ReminderTemplate, RepositoryError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r"
            INSERT INTO reminder_template (owner_id, event_type, template)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id, event_type)
            DO UPDATE SET template = EXCLUDED.template, updated_at = now()
            RETURNING owner_id, event_type, template, updated_at
            ",
        )
        .bind(owner.as_i32())
        .bind(event_type.as_str())
        .bind(template)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_templates(
        &self,
        owner: PrincipalId,
    ) -> Result<Vec<ReminderTemplate>, RepositoryError> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            r"
            SELECT owner_id, event_type, template, updated_at
            FROM reminder_template
            WHERE owner_id = $1
            ORDER BY event_type
            ",
        )
        .bind(owner.as_i32())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

impl NotificationLedger for PgStore {
    async fn last_notified(
        &self,
        customer: CustomerId,
        event_type: EventType,
    ) -> Result<Option<NaiveDate>, RepositoryError> {
        let date = sqlx::query_scalar::<_, NaiveDate>(
            r"
            SELECT last_notified FROM reminder_delivery
            WHERE customer_id = $1 AND event_type = $2
            ",
        )
        .bind(customer.as_i32())
        .bind(event_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(date)
    }

    async fn record_notified(
        &self,
        customer: CustomerId,
        event_type: EventType,
        occurrence: NaiveDate,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO reminder_delivery (customer_id, event_type, last_notified)
            VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, event_type)
            DO UPDATE SET last_notified = EXCLUDED.last_notified
            ",
        )
        .bind(customer.as_i32())
        .bind(event_type.as_str())
        .bind(occurrence)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIGRATIONS: [&str; 3] = [
        include_str!("../../migrations/20240601000001_principals.sql"),
        include_str!("../../migrations/20240601000002_customers.sql"),
        include_str!("../../migrations/20240601000003_reminders.sql"),
    ];

    /// `PostgreSQL` rejects index expressions that are not IMMUTABLE.
    #[test]
    fn test_index_expressions_are_immutable() {
        let indexes = MIGRATIONS
            .iter()
            .flat_map(|sql| sql.split(';'))
            .map(|statement| {
                statement
                    .lines()
                    .filter(|line| !line.trim_start().starts_with("--"))
                    .collect::<Vec<_>>()
                    .join("\n")
                    .to_lowercase()
            })
            .filter(|statement| statement.contains("create index"));

        let mut count = 0;
        for index in indexes {
            count += 1;
            for stable in ["to_char(", "now()", "current_date", "age("] {
                assert!(!index.contains(stable), "{index}");
            }
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("ana"), "ana");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
