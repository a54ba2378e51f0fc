//! Domain models shared by stores, services and routes.

pub mod customer;
pub mod principal;
pub mod reminder;

pub use customer::{Customer, CustomerRecord, NewCustomer};
pub use principal::{NewPrincipal, Principal, Profile};
pub use reminder::{ReminderCandidate, ReminderTemplate};
