//! In-memory store.
//!
//! Backs development runs without a database and every test that does not
//! need `PostgreSQL`. Lock guards never live across an `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use glamdesk_core::{CustomerId, Email, EventType, MonthDay, PrincipalId};

use super::{
    CustomerStore, NotificationLedger, PrincipalStore, RepositoryError, TemplateStore,
};
use crate::models::{
    CustomerRecord, NewCustomer, NewPrincipal, Principal, ReminderCandidate, ReminderTemplate,
};
use crate::validation::ValidProfile;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    last_principal_id: i32,
    last_customer_id: i32,
    principals: BTreeMap<PrincipalId, Principal>,
    customers: BTreeMap<CustomerId, CustomerRecord>,
    templates: HashMap<(PrincipalId, EventType), ReminderTemplate>,
    ledger: HashMap<(CustomerId, EventType), NaiveDate>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_by(record: &CustomerRecord, owner: PrincipalId) -> bool {
    record.owner_id == owner
}

impl PrincipalStore for MemoryStore {
    async fn insert_principal(&self, new: NewPrincipal) -> Result<Principal, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.principals.values().any(|p| p.email == new.email) {
            return Err(RepositoryError::Conflict(format!(
                "email {} already registered",
                new.email
            )));
        }

        inner.last_principal_id += 1;
        let now = Utc::now();
        let principal = Principal {
            id: PrincipalId::new(inner.last_principal_id),
            email: new.email,
            password_hash: new.password_hash,
            name: new.profile.name,
            salon_name: new.profile.salon_name,
            phone: new.profile.phone,
            address: new.profile.address,
            created_at: now,
            updated_at: now,
        };
        inner.principals.insert(principal.id, principal.clone());
        Ok(principal)
    }

    async fn find_principal_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Principal>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.principals.values().find(|p| &p.email == email).cloned())
    }

    async fn get_principal(&self, id: PrincipalId) -> Result<Principal, RepositoryError> {
        let inner = self.inner.read().await;
        inner
            .principals
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_profile(
        &self,
        id: PrincipalId,
        profile: ValidProfile,
    ) -> Result<Principal, RepositoryError> {
        let mut inner = self.inner.write().await;
        let principal = inner
            .principals
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        principal.name = profile.name;
        principal.salon_name = profile.salon_name;
        principal.phone = profile.phone;
        principal.address = profile.address;
        principal.updated_at = Utc::now();
        Ok(principal.clone())
    }
}

impl CustomerStore for MemoryStore {
    async fn insert_customer(
        &self,
        owner: PrincipalId,
        customer: NewCustomer,
    ) -> Result<CustomerRecord, RepositoryError> {
        let mut inner = self.inner.write().await;
        if !inner.principals.contains_key(&owner) {
            return Err(RepositoryError::NotFound);
        }

        inner.last_customer_id += 1;
        let now = Utc::now();
        let record = CustomerRecord {
            id: CustomerId::new(inner.last_customer_id),
            owner_id: owner,
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            birthday: customer.birthday,
            anniversary: customer.anniversary,
            created_at: now,
            updated_at: now,
        };
        inner.customers.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_customer(
        &self,
        owner: PrincipalId,
        id: CustomerId,
    ) -> Result<CustomerRecord, RepositoryError> {
        let inner = self.inner.read().await;
        inner
            .customers
            .get(&id)
            .filter(|c| owned_by(c, owner))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_customers(
        &self,
        owner: PrincipalId,
    ) -> Result<Vec<CustomerRecord>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut customers: Vec<_> = inner
            .customers
            .values()
            .filter(|c| owned_by(c, owner))
            .cloned()
            .collect();
        customers.sort_by_cached_key(|c| (c.name.to_lowercase(), c.id));
        Ok(customers)
    }

    async fn search_customers_by_name(
        &self,
        owner: PrincipalId,
        query: &str,
    ) -> Result<Vec<CustomerRecord>, RepositoryError> {
        let needle = query.trim().to_lowercase();
        let mut customers = self.list_customers(owner).await?;
        customers.retain(|c| c.name.to_lowercase().contains(&needle));
        Ok(customers)
    }

    async fn update_customer(
        &self,
        owner: PrincipalId,
        id: CustomerId,
        customer: NewCustomer,
    ) -> Result<CustomerRecord, RepositoryError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .customers
            .get_mut(&id)
            .filter(|c| owned_by(c, owner))
            .ok_or(RepositoryError::NotFound)?;
        record.name = customer.name;
        record.phone = customer.phone;
        record.email = customer.email;
        record.birthday = customer.birthday;
        record.anniversary = customer.anniversary;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_customer(
        &self,
        owner: PrincipalId,
        id: CustomerId,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        if !inner.customers.get(&id).is_some_and(|c| owned_by(c, owner)) {
            return Err(RepositoryError::NotFound);
        }
        inner.customers.remove(&id);
        inner.ledger.retain(|(customer, _), _| *customer != id);
        Ok(())
    }

    async fn find_customers_matching_month_day(
        &self,
        month_day: MonthDay,
    ) -> Result<Vec<ReminderCandidate>, RepositoryError> {
        let inner = self.inner.read().await;
        let hits = |date: Option<NaiveDate>| date.is_some_and(|d| month_day.matches(d));

        inner
            .customers
            .values()
            .filter(|c| hits(c.birthday) || hits(c.anniversary))
            .map(|c| {
                let owner = inner.principals.get(&c.owner_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "customer {} has no owner {}",
                        c.id, c.owner_id
                    ))
                })?;
                Ok(ReminderCandidate {
                    owner_id: c.owner_id,
                    customer_id: c.id,
                    customer_name: c.name.clone(),
                    phone: c.phone.clone(),
                    salon_name: owner.salon_name.clone(),
                    birthday: c.birthday,
                    anniversary: c.anniversary,
                })
            })
            .collect()
    }
}

impl TemplateStore for MemoryStore {
    async fn get_template(
        &self,
        owner: PrincipalId,
        event_type: EventType,
    ) -> Result<Option<ReminderTemplate>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.templates.get(&(owner, event_type)).cloned())
    }

    async fn upsert_template(
        &self,
        owner: PrincipalId,
        event_type: EventType,
        template: String,
    ) -> Result<ReminderTemplate, RepositoryError> {
        let mut inner = self.inner.write().await;
        let saved = ReminderTemplate {
            owner_id: owner,
            event_type,
            template,
            updated_at: Utc::now(),
        };
        inner.templates.insert((owner, event_type), saved.clone());
        Ok(saved)
    }

    async fn list_templates(
        &self,
        owner: PrincipalId,
    ) -> Result<Vec<ReminderTemplate>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut templates: Vec<_> = inner
            .templates
            .values()
            .filter(|t| t.owner_id == owner)
            .cloned()
            .collect();
        templates.sort_by_key(|t| t.event_type);
        Ok(templates)
    }
}

impl NotificationLedger for MemoryStore {
    async fn last_notified(
        &self,
        customer: CustomerId,
        event_type: EventType,
    ) -> Result<Option<NaiveDate>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.ledger.get(&(customer, event_type)).copied())
    }

    async fn record_notified(
        &self,
        customer: CustomerId,
        event_type: EventType,
        occurrence: NaiveDate,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        inner.ledger.insert((customer, event_type), occurrence);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use glamdesk_core::EncryptedField;

    use super::*;

    fn profile(salon: &str) -> ValidProfile {
        ValidProfile {
            name: "Owner".to_string(),
            salon_name: salon.to_string(),
            phone: "+14155550123".to_string(),
            address: "12 Market Street".to_string(),
        }
    }

    async fn owner(store: &MemoryStore, email: &str, salon: &str) -> PrincipalId {
        store
            .insert_principal(NewPrincipal {
                email: Email::parse(email).unwrap(),
                password_hash: "hash".to_string(),
                profile: profile(salon),
            })
            .await
            .unwrap()
            .id
    }

    fn customer(name: &str, birthday: Option<&str>) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            phone: EncryptedField::from_bytes(vec![1; 28]),
            email: EncryptedField::from_bytes(vec![2; 28]),
            birthday: birthday.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            anniversary: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        owner(&store, "a@salon.com", "A").await;
        let err = store
            .insert_principal(NewPrincipal {
                email: Email::parse("A@Salon.com").unwrap(),
                password_hash: "hash".to_string(),
                profile: profile("B"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_customers_are_owner_scoped() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice@salon.com", "A").await;
        let bob = owner(&store, "bob@salon.com", "B").await;

        let record = store.insert_customer(alice, customer("Ana", None)).await.unwrap();

        assert!(matches!(
            store.get_customer(bob, record.id).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            store.delete_customer(bob, record.id).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(store.list_customers(bob).await.unwrap().is_empty());
        assert_eq!(store.list_customers(alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice@salon.com", "A").await;
        store.insert_customer(alice, customer("Maria Lopez", None)).await.unwrap();
        store.insert_customer(alice, customer("Marco Polo", None)).await.unwrap();
        store.insert_customer(alice, customer("Zoe", None)).await.unwrap();

        let hits = store.search_customers_by_name(alice, "MAR").await.unwrap();
        let names: Vec<_> = hits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Marco Polo", "Maria Lopez"]);
    }

    #[tokio::test]
    async fn test_month_day_scan_spans_owners() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice@salon.com", "Alice Cuts").await;
        let bob = owner(&store, "bob@salon.com", "Bob Styles").await;
        store.insert_customer(alice, customer("Ana", Some("1990-06-08"))).await.unwrap();
        store.insert_customer(bob, customer("Ben", Some("1985-06-08"))).await.unwrap();
        store.insert_customer(bob, customer("Cy", Some("1985-06-09"))).await.unwrap();

        let hits = store
            .find_customers_matching_month_day("06-08".parse().unwrap())
            .await
            .unwrap();
        let salons: Vec<_> = hits.iter().map(|c| c.salon_name.as_str()).collect();
        assert_eq!(salons, ["Alice Cuts", "Bob Styles"]);
    }

    #[tokio::test]
    async fn test_upsert_template_replaces() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice@salon.com", "A").await;
        store
            .upsert_template(alice, EventType::Birthday, "first".to_string())
            .await
            .unwrap();
        store
            .upsert_template(alice, EventType::Birthday, "second".to_string())
            .await
            .unwrap();

        let templates = store.list_templates(alice).await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].template, "second");
    }
}
