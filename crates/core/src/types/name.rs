//! Patient full name.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Letters from the Latin script (accented ones included) and whitespace.
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{Latin}\s]+$").expect("Invalid regex"));

/// Errors that can occur when parsing a [`FullName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FullNameError {
    /// The input is empty or only whitespace.
    #[error("full name cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("full name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length in characters.
        max: usize,
    },
    /// The input contains something other than letters and whitespace.
    #[error("full name should only contain letters")]
    InvalidCharacters,
}

/// A patient's full name, normalized to title case.
///
/// Parsing validates the character set and normalizes casing and spacing:
///
/// ```
/// use patient_registry_core::FullName;
///
/// let name = FullName::parse("  juan   PEREZ ").unwrap();
/// assert_eq!(name.as_str(), "Juan Perez");
///
/// assert!(FullName::parse("R2-D2").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FullName(String);

impl FullName {
    /// Maximum length in characters (matches the `VARCHAR(255)` column).
    pub const MAX_LENGTH: usize = 255;

    /// Validate and normalize a full name.
    ///
    /// # Errors
    ///
    /// Returns [`FullNameError`] if the input is blank, too long, or contains
    /// characters other than letters and whitespace.
    pub fn parse(s: &str) -> Result<Self, FullNameError> {
        if s.trim().is_empty() {
            return Err(FullNameError::Empty);
        }

        if !NAME_PATTERN.is_match(s) {
            return Err(FullNameError::InvalidCharacters);
        }

        let normalized = title_case(s);
        if normalized.chars().count() > Self::MAX_LENGTH {
            return Err(FullNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(normalized))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `FullName` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Title-case each whitespace-separated word and join with single spaces.
///
/// The first character of every word is uppercased and the rest lowercased.
#[must_use]
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FullName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
