//! Patient domain types.
//!
//! These types represent validated domain objects separate from database row
//! types and HTTP payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::PatientId;
use super::name::{FullName, FullNameError};
use super::phone::{PhoneCountryCode, PhoneError, PhoneNumber, full_phone_number};
use super::validation::ValidationErrors;

/// Photo reference used when a patient is created without an uploaded photo.
pub const PLACEHOLDER_PHOTO_URL: &str = "placeholder.jpg";

/// Field names as they appear on the wire.
pub mod fields {
    /// Full name field.
    pub const FULL_NAME: &str = "fullName";
    /// Email field.
    pub const EMAIL: &str = "email";
    /// Country code field.
    pub const PHONE_COUNTRY_CODE: &str = "phoneCountryCode";
    /// Subscriber number field.
    pub const PHONE_NUMBER: &str = "phoneNumber";
    /// Uploaded document photo field.
    pub const DOCUMENT_PHOTO: &str = "documentPhoto";

    /// Text fields accepted by the registration form.
    pub const TEXT_FIELDS: [&str; 4] = [FULL_NAME, EMAIL, PHONE_COUNTRY_CODE, PHONE_NUMBER];
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Unique patient ID, assigned by the store.
    pub id: PatientId,
    /// Title-cased full name.
    pub full_name: FullName,
    /// Unique email address.
    pub email: Email,
    /// Dialling prefix, e.g. `+54`.
    pub phone_country_code: PhoneCountryCode,
    /// Subscriber number.
    pub phone_number: PhoneNumber,
    /// Reference to the stored document photo.
    pub document_photo_url: String,
    /// When the patient was registered.
    pub created_at: DateTime<Utc>,
    /// When the record was last touched.
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Country code and number concatenated, e.g. `+541122334455`.
    #[must_use]
    pub fn full_phone_number(&self) -> String {
        full_phone_number(&self.phone_country_code, &self.phone_number)
    }
}

/// Raw registration fields as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientForm {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_country_code: Option<String>,
    pub phone_number: Option<String>,
}

impl PatientForm {
    /// Set a text field by its wire name. Returns `false` for unknown names.
    pub fn set(&mut self, field: &str, value: String) -> bool {
        let slot = match field {
            fields::FULL_NAME => &mut self.full_name,
            fields::EMAIL => &mut self.email,
            fields::PHONE_COUNTRY_CODE => &mut self.phone_country_code,
            fields::PHONE_NUMBER => &mut self.phone_number,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// A validated registration, ready to be persisted.
///
/// Only obtainable through [`NewPatient::parse`], so every instance satisfies
/// the name, email-domain and phone invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    full_name: FullName,
    email: Email,
    phone_country_code: PhoneCountryCode,
    phone_number: PhoneNumber,
}

impl NewPatient {
    /// Title-cased full name.
    #[must_use]
    pub const fn full_name(&self) -> &FullName {
        &self.full_name
    }

    /// Gmail address.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Dialling prefix.
    #[must_use]
    pub const fn phone_country_code(&self) -> &PhoneCountryCode {
        &self.phone_country_code
    }

    /// Subscriber number.
    #[must_use]
    pub const fn phone_number(&self) -> &PhoneNumber {
        &self.phone_number
    }

    /// Build the persisted record from the fields the store assigns.
    #[must_use]
    pub fn into_patient(
        self,
        id: PatientId,
        document_photo_url: String,
        created_at: DateTime<Utc>,
    ) -> Patient {
        Patient {
            id,
            full_name: self.full_name,
            email: self.email,
            phone_country_code: self.phone_country_code,
            phone_number: self.phone_number,
            document_photo_url,
            created_at,
            updated_at: created_at,
        }
    }

    /// Validate a registration form.
    ///
    /// Every field is checked; the first failure of each field is reported.
    ///
    /// # Errors
    ///
    /// Returns a field-keyed [`ValidationErrors`] map when any field is invalid.
    pub fn parse(form: &PatientForm) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let full_name = validate_full_name(form.full_name.as_deref())
            .map_err(|msg| errors.add(fields::FULL_NAME, msg))
            .ok();
        let email = validate_email(form.email.as_deref())
            .map_err(|msg| errors.add(fields::EMAIL, msg))
            .ok();
        let phone_country_code = validate_country_code(form.phone_country_code.as_deref())
            .map_err(|msg| errors.add(fields::PHONE_COUNTRY_CODE, msg))
            .ok();
        let phone_number = validate_phone_number(form.phone_number.as_deref())
            .map_err(|msg| errors.add(fields::PHONE_NUMBER, msg))
            .ok();

        match (full_name, email, phone_country_code, phone_number) {
            (Some(full_name), Some(email), Some(phone_country_code), Some(phone_number)) => {
                Ok(Self {
                    full_name,
                    email,
                    phone_country_code,
                    phone_number,
                })
            }
            _ => Err(errors),
        }
    }
}

fn validate_full_name(value: Option<&str>) -> Result<FullName, &'static str> {
    let value = value.unwrap_or_default();
    FullName::parse(value).map_err(|e| match e {
        FullNameError::Empty => "Full name is required",
        FullNameError::InvalidCharacters => "Full name should only contain letters",
        FullNameError::TooLong { .. } => "Full name must be at most 255 characters",
    })
}

fn validate_email(value: Option<&str>) -> Result<Email, &'static str> {
    let value = value.unwrap_or_default();
    if value.trim().is_empty() {
        return Err("Email is required");
    }
    let email = Email::parse(value).map_err(|_| "Email must be valid")?;
    if !email.is_gmail() {
        return Err("Email must be a @gmail.com address");
    }
    Ok(email)
}

fn validate_country_code(value: Option<&str>) -> Result<PhoneCountryCode, &'static str> {
    PhoneCountryCode::parse(value.unwrap_or_default()).map_err(|e| match e {
        PhoneError::Empty => "Phone country code is required",
        _ => "Country code must be in E.164 format (e.g., +1, +54, +598)",
    })
}

fn validate_phone_number(value: Option<&str>) -> Result<PhoneNumber, &'static str> {
    PhoneNumber::parse(value.unwrap_or_default()).map_err(|e| match e {
        PhoneError::Empty => "Phone number is required",
        _ => "Phone number must contain only digits (6-15 characters, E.164 format)",
    })
}
