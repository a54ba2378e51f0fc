//! Input validation for registration, profile, customer and template forms.
//!
//! Raw form values arrive as strings. Each `validate` turns them into a typed
//! value the services can trust, or the first [`ValidationError`] found.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use glamdesk_core::{Email, EmailError};

const MAX_NAME_LEN: usize = 100;
const MIN_ADDRESS_LEN: usize = 10;
const MAX_ADDRESS_LEN: usize = 200;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 64;
pub const MAX_TEMPLATE_LEN: usize = 1000;

/// E.164: `+`, a non-zero country digit, then 9-14 more digits.
static OWNER_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{9,14}$").expect("Invalid regex"));

/// Customer phones are free-form but limited to dialable characters.
static CUSTOMER_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9 +()-]*$").expect("Invalid regex"));

static PASSWORD_SYMBOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[!@#~$%^&*()_+\-={}\[\]:;"'<>,.?/\\|]"#).expect("Invalid regex")
});

/// A rejected input, phrased for the person who submitted it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
    #[error("phone must be in international format (e.g. +12345678901)")]
    OwnerPhone,
    #[error("invalid phone number format")]
    CustomerPhone,
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),
    #[error("invalid {0} format (YYYY-MM-DD)")]
    Date(&'static str),
    #[error("password must be 8-64 characters")]
    PasswordLength,
    #[error("password must contain at least one {0}")]
    PasswordMissing(&'static str),
    #[error("invalid event type: {0}")]
    EventType(String),
}

/// Enforce the password policy: 8-64 characters with an uppercase letter, a
/// lowercase letter, a digit and a symbol.
///
/// # Errors
///
/// Returns the first rule the password breaks.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(ValidationError::PasswordLength);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::PasswordMissing("uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::PasswordMissing("lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissing("digit"));
    }
    if !PASSWORD_SYMBOL.is_match(password) {
        return Err(ValidationError::PasswordMissing("special character"));
    }
    Ok(())
}

// =============================================================================
// Principal
// =============================================================================

/// Profile fields shared by registration and profile update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "salonName")]
    pub salon_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Validated, trimmed profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfile {
    pub name: String,
    pub salon_name: String,
    pub phone: String,
    pub address: String,
}

impl ProfileForm {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(self) -> Result<ValidProfile, ValidationError> {
        let name = required("name", &self.name)?;
        max_len("name", &name, MAX_NAME_LEN)?;

        let salon_name = required("salon name", &self.salon_name)?;
        max_len("salon name", &salon_name, MAX_NAME_LEN)?;

        let address = required("address", &self.address)?;
        if address.chars().count() < MIN_ADDRESS_LEN {
            return Err(ValidationError::TooShort {
                field: "address",
                min: MIN_ADDRESS_LEN,
            });
        }
        max_len("address", &address, MAX_ADDRESS_LEN)?;

        let phone = self.phone.trim().to_string();
        if !OWNER_PHONE.is_match(&phone) {
            return Err(ValidationError::OwnerPhone);
        }

        Ok(ValidProfile {
            name,
            salon_name,
            phone,
            address,
        })
    }
}

/// Registration form.
#[derive(Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(flatten)]
    pub profile: ProfileForm,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("profile", &self.profile)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Debug for ValidRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidRegistration")
            .field("profile", &self.profile)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A registration that passed validation. The password is still plaintext
/// and must be hashed before storage.
pub struct ValidRegistration {
    pub profile: ValidProfile,
    pub email: Email,
    pub password: String,
}

impl RegistrationForm {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(self) -> Result<ValidRegistration, ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::Required("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::Required("password"));
        }
        let profile = self.profile.validate()?;
        let email = Email::parse(&self.email)?;
        validate_password(&self.password)?;

        Ok(ValidRegistration {
            profile,
            email,
            password: self.password,
        })
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Customer create/update payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub anniversary: Option<String>,
}

/// Validated customer fields, still in plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCustomer {
    pub name: String,
    /// Empty when no phone was given.
    pub phone: String,
    pub email: Option<Email>,
    pub birthday: Option<NaiveDate>,
    pub anniversary: Option<NaiveDate>,
}

impl CustomerForm {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(self) -> Result<ValidCustomer, ValidationError> {
        let name = required("name", &self.name)?;
        max_len("name", &name, MAX_NAME_LEN)?;

        let phone = non_blank(self.phone).unwrap_or_default();
        if !CUSTOMER_PHONE.is_match(&phone) {
            return Err(ValidationError::CustomerPhone);
        }

        let email = non_blank(self.email)
            .map(|e| Email::parse(&e))
            .transpose()?;
        let birthday = parse_date("birthday", self.birthday)?;
        let anniversary = parse_date("anniversary", self.anniversary)?;

        Ok(ValidCustomer {
            name,
            phone,
            email,
            birthday,
            anniversary,
        })
    }
}

/// Reminder templates must be non-blank and bounded.
///
/// # Errors
///
/// Returns `Required` or `TooLong`.
pub fn validate_template(template: &str) -> Result<String, ValidationError> {
    let template = required("template", template)?;
    max_len("template", &template, MAX_TEMPLATE_LEN)?;
    Ok(template)
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(value.to_string())
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<NaiveDate>, ValidationError> {
    non_blank(value)
        .map(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").map_err(|_| ValidationError::Date(field)))
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile() -> ProfileForm {
        ProfileForm {
            name: " Priya Shah ".to_string(),
            salon_name: "Shear Bliss".to_string(),
            phone: "+14155550123".to_string(),
            address: "12 Market Street, Springfield".to_string(),
        }
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Abc12345!").is_ok());
        assert_eq!(
            validate_password("Ab1!"),
            Err(ValidationError::PasswordLength)
        );
        assert_eq!(
            validate_password(&format!("Ab1!{}", "x".repeat(61))),
            Err(ValidationError::PasswordLength)
        );
        assert_eq!(
            validate_password("abc12345!"),
            Err(ValidationError::PasswordMissing("uppercase letter"))
        );
        assert_eq!(
            validate_password("ABC12345!"),
            Err(ValidationError::PasswordMissing("lowercase letter"))
        );
        assert_eq!(
            validate_password("Abcdefgh!"),
            Err(ValidationError::PasswordMissing("digit"))
        );
        assert_eq!(
            validate_password("Abc123456"),
            Err(ValidationError::PasswordMissing("special character"))
        );
    }

    #[test]
    fn test_profile_trims_and_validates() {
        let valid = profile().validate().unwrap();
        assert_eq!(valid.name, "Priya Shah");
    }

    #[test]
    fn test_profile_rejects() {
        let mut form = profile();
        form.phone = "4155550123".to_string();
        assert_eq!(form.validate(), Err(ValidationError::OwnerPhone));

        let mut form = profile();
        form.address = "short".to_string();
        assert!(matches!(
            form.validate(),
            Err(ValidationError::TooShort { field: "address", .. })
        ));

        let mut form = profile();
        form.salon_name = "x".repeat(101);
        assert!(matches!(
            form.validate(),
            Err(ValidationError::TooLong { field: "salon name", .. })
        ));
    }

    #[test]
    fn test_registration() {
        let form = RegistrationForm {
            profile: profile(),
            email: "Owner@ShearBliss.com".to_string(),
            password: "Abc12345!".to_string(),
        };
        let valid = form.validate().unwrap();
        assert_eq!(valid.email.as_str(), "owner@shearbliss.com");
        assert!(!format!("{valid:?}").contains("Abc12345!"));

        let form = RegistrationForm {
            profile: profile(),
            email: "owner@shearbliss.com".to_string(),
            password: "weak".to_string(),
        };
        assert_eq!(form.validate().unwrap_err(), ValidationError::PasswordLength);
    }

    #[test]
    fn test_customer_optional_fields() {
        let valid = CustomerForm {
            name: "Ana".to_string(),
            phone: Some("  ".to_string()),
            email: Some(String::new()),
            birthday: None,
            anniversary: Some("2015-09-12".to_string()),
        }
        .validate()
        .unwrap();

        assert_eq!(valid.phone, "");
        assert_eq!(valid.email, None);
        assert_eq!(valid.anniversary, NaiveDate::from_ymd_opt(2015, 9, 12));
    }

    #[test]
    fn test_customer_rejects() {
        let bad_phone = CustomerForm {
            name: "Ana".to_string(),
            phone: Some("555-CALL-ANA".to_string()),
            ..CustomerForm::default()
        };
        assert_eq!(bad_phone.validate(), Err(ValidationError::CustomerPhone));

        let bad_date = CustomerForm {
            name: "Ana".to_string(),
            birthday: Some("12/09/1990".to_string()),
            ..CustomerForm::default()
        };
        assert_eq!(bad_date.validate(), Err(ValidationError::Date("birthday")));

        assert_eq!(
            CustomerForm::default().validate(),
            Err(ValidationError::Required("name"))
        );
    }

    #[test]
    fn test_template_bounds() {
        assert_eq!(
            validate_template("  Hi [CustomerName]  ").unwrap(),
            "Hi [CustomerName]"
        );
        assert_eq!(validate_template("   "), Err(ValidationError::Required("template")));
        assert!(validate_template(&"x".repeat(MAX_TEMPLATE_LEN + 1)).is_err());
    }
}
