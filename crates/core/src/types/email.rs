//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The only mail domain patients may register with.
pub const GMAIL_DOMAIN: &str = "gmail.com";

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain an @ symbol.
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    /// The input contains more than one @ symbol.
    #[error("email must contain exactly one @ symbol")]
    MultipleAtSymbols,
    /// The input contains whitespace or control characters.
    #[error("email cannot contain whitespace")]
    Whitespace,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The local part is not a dot-atom (RFC 5322).
    #[error("email local part is malformed")]
    MalformedLocalPart,
    /// The domain part (after @) is empty.
    #[error("email domain cannot be empty")]
    EmptyDomain,
    /// The domain part is not a dotted host name.
    #[error("email domain is malformed")]
    MalformedDomain,
}

/// An email address.
///
/// ## Constraints
///
/// - Length: 1-254 characters (RFC 5321 limit)
/// - Exactly one @ symbol, no whitespace
/// - Local part (before @) is a dot-atom: atext characters separated by
///   single dots
/// - Domain part (after @) is a dotted host name of letters, digits and
///   hyphens
///
/// Parsing is deliberately syntactic only; the registration policy
/// (Gmail-only) is checked separately via [`Email::is_gmail`].
///
/// ## Examples
///
/// ```
/// use patient_registry_core::Email;
///
/// assert!(Email::parse("user@gmail.com").is_ok());
/// assert!(Email::parse("user.name+tag@domain.co.uk").is_ok());
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("a@b@gmail.com").is_err());
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first constraint the input
    /// violates.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::MissingAtSymbol)?;

        if domain.contains('@') {
            return Err(EmailError::MultipleAtSymbols);
        }

        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }

        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        if !is_dot_atom(local) {
            return Err(EmailError::MalformedLocalPart);
        }

        if !domain.contains('.') || !domain.split('.').all(is_host_label) {
            return Err(EmailError::MalformedDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split('@').nth(1).unwrap_or("")
    }

    /// Whether the address belongs to the Gmail domain (case-insensitive).
    #[must_use]
    pub fn is_gmail(&self) -> bool {
        self.domain().eq_ignore_ascii_case(GMAIL_DOMAIN)
    }
}

/// RFC 5322 `atext`.
const fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '/' | '=' | '?' | '^' | '_'
                | '`' | '{' | '|' | '}' | '~'
        )
}

/// One or more atext runs joined by single dots.
fn is_dot_atom(s: &str) -> bool {
    s.split('.')
        .all(|atom| !atom.is_empty() && atom.chars().all(is_atext))
}

fn is_host_label(label: &str) -> bool {
    !label.is_empty()
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("user@gmail.com").is_ok());
        assert!(Email::parse("user.name@example.com").is_ok());
        assert!(Email::parse("user+tag@example.com").is_ok());
        assert!(Email::parse("user@subdomain.example.com").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
        assert!(Email::parse("o'brien_x-y@gmail.com").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@gmail.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_missing_at() {
        assert_eq!(Email::parse("test"), Err(EmailError::MissingAtSymbol));
    }

    #[test]
    fn test_parse_multiple_at() {
        assert_eq!(
            Email::parse("juan@jorge@gmail.com"),
            Err(EmailError::MultipleAtSymbols)
        );
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(
            Email::parse("test user@gmail.com"),
            Err(EmailError::Whitespace)
        );
    }

    #[test]
    fn test_parse_empty_parts() {
        assert_eq!(Email::parse("@gmail.com"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("user@"), Err(EmailError::EmptyDomain));
    }

    #[test]
    fn test_parse_malformed_domain() {
        assert_eq!(
            Email::parse("user@localhost"),
            Err(EmailError::MalformedDomain)
        );
        assert_eq!(
            Email::parse("user@gmail..com"),
            Err(EmailError::MalformedDomain)
        );
        assert_eq!(
            Email::parse("user@.gmail.com"),
            Err(EmailError::MalformedDomain)
        );
    }

    #[test]
    fn test_parse_malformed_local_part() {
        for input in [
            "a,b@gmail.com",
            "<x>@gmail.com",
            "a(b)@gmail.com",
            "\"@gmail.com",
            "a;b@gmail.com",
            ".user@gmail.com",
            "user.@gmail.com",
            "us..er@gmail.com",
        ] {
            assert_eq!(
                Email::parse(input),
                Err(EmailError::MalformedLocalPart),
                "{input}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_bad_host_characters() {
        assert_eq!(
            Email::parse("user@gm_ail.com"),
            Err(EmailError::MalformedDomain)
        );
        assert_eq!(
            Email::parse("user@-gmail.com"),
            Err(EmailError::MalformedDomain)
        );
    }

    #[test]
    fn test_domain() {
        let email = Email::parse("user@gmail.com").unwrap();
        assert_eq!(email.domain(), "gmail.com");
    }

    #[test]
    fn test_is_gmail() {
        assert!(Email::parse("test@gmail.com").unwrap().is_gmail());
        assert!(Email::parse("TEST@GMAIL.COM").unwrap().is_gmail());
        assert!(Email::parse("test+label@gmail.com").unwrap().is_gmail());
        assert!(Email::parse("test.user.name@gmail.com").unwrap().is_gmail());

        assert!(!Email::parse("test@hotmail.com").unwrap().is_gmail());
        assert!(!Email::parse("user@yahoo.com").unwrap().is_gmail());
        assert!(!Email::parse("test@gmail.org").unwrap().is_gmail());
        assert!(!Email::parse("test@notgmail.com").unwrap().is_gmail());
        assert!(!Email::parse("test@mail.gmail.com").unwrap().is_gmail());
    }

    #[test]
    fn test_serde_roundtrip() {
        let email = Email::parse("user@gmail.com").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"user@gmail.com\"");

        let parsed: Email = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, email);
    }
}
