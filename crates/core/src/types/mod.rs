//! Core types for the patient registry.
//!
//! This module provides validated wrappers for the values a patient record is
//! made of, plus the listing query and page types.

pub mod email;
pub mod id;
pub mod listing;
pub mod name;
pub mod patient;
pub mod phone;
pub mod validation;

pub use email::{Email, EmailError, GMAIL_DOMAIN};
pub use id::*;
pub use listing::{ListQuery, ListQueryError, Page, PageMeta, SortField, SortOrder, escape_like};
pub use name::{FullName, FullNameError, title_case};
pub use patient::{NewPatient, PLACEHOLDER_PHOTO_URL, Patient, PatientForm, fields};
pub use phone::{PhoneCountryCode, PhoneError, PhoneNumber, full_phone_number};
pub use validation::ValidationErrors;
