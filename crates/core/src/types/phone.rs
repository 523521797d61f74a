//! Phone number fragments.
//!
//! A phone number is stored split into a `+`-prefixed country code and a
//! digit-only subscriber number. Concatenated they form the E.164 number.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing phone fragments.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is empty.
    #[error("phone value cannot be empty")]
    Empty,
    /// The country code is not `+` followed by 1-4 digits.
    #[error("country code must be '+' followed by 1-4 digits")]
    InvalidCountryCode,
    /// The subscriber number is not 6-15 digits.
    #[error("phone number must contain 6-15 digits")]
    InvalidNumber,
}

/// International dialling prefix, e.g. `+54`.
///
/// ```
/// use patient_registry_core::PhoneCountryCode;
///
/// assert!(PhoneCountryCode::parse("+598").is_ok());
/// assert!(PhoneCountryCode::parse("54").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneCountryCode(String);

impl PhoneCountryCode {
    /// Maximum number of digits after the `+`.
    pub const MAX_DIGITS: usize = 4;

    /// Parse a country code.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] if the input is not `+` followed by 1-4 ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let digits = s
            .strip_prefix('+')
            .ok_or(PhoneError::InvalidCountryCode)?;

        if digits.is_empty()
            || digits.len() > Self::MAX_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PhoneError::InvalidCountryCode);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the country code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Subscriber number without country code, 6-15 digits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 6;
    /// Maximum number of digits (E.164 limit).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a subscriber number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] if the input is not 6-15 ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&s.len())
            || !s.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PhoneError::InvalidNumber);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Concatenate the fragments into a full international number.
#[must_use]
pub fn full_phone_number(code: &PhoneCountryCode, number: &PhoneNumber) -> String {
    format!("{}{}", code.0, number.0)
}

impl fmt::Display for PhoneCountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
