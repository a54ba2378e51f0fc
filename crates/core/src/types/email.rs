//! Email address type.
//!
//! Principals log in with an email address, and customers may carry one. The
//! principal's email is a lookup key so it is normalized to lowercase; the
//! customer email is stored encrypted and only ever compared after decryption.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain exactly one @ symbol")]
    AtSymbol,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain must contain a dot")]
    InvalidDomain,
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// A syntactically valid, lowercase email address.
///
/// ## Constraints
///
/// - Length: 1-254 characters (RFC 5321 limit), after trimming
/// - Exactly one `@`, non-empty local part
/// - Domain contains a dot that is neither its first nor last character
/// - No interior whitespace
///
/// ```
/// use glamdesk_core::Email;
///
/// let email = Email::parse("  Owner@Salon.Example ").unwrap();
/// assert_eq!(email.as_str(), "owner@salon.example");
///
/// assert!(Email::parse("owner@localhost").is_err());
/// assert!(Email::parse("a@b@c.d").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an `Email`.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::AtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::AtSymbol);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        let dotted = domain
            .find('.')
            .is_some_and(|i| i > 0 && !domain.ends_with('.'));
        if !dotted {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(s.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, d)| d)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
