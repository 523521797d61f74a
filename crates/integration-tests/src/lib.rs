//! Integration tests for the patient registry.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and a mail catcher, then apply migrations
//! cargo run -p patient-registry-cli -- migrate
//!
//! # Start the server in another terminal
//! cargo run -p patient-registry-server
//!
//! # Run the ignored tests
//! cargo test -p patient-registry-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `patients_api` - HTTP API against a running server (`PATIENTS_BASE_URL`)
//! - `pg_store` - `PgPatientStore` against a live database (`DATABASE_URL`)

use reqwest::multipart::{Form, Part};
use uuid::Uuid;

/// Minimal JPEG payload (SOI, APP0 marker, EOI).
pub const TINY_JPEG: &[u8] =
    b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00\x01\x01\x00\x00\x01\x00\x01\x00\x00\xFF\xD9";

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("PATIENTS_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A gmail address no other test run has used.
#[must_use]
pub fn unique_email() -> String {
    format!("it.{}@gmail.com", Uuid::new_v4().simple())
}

/// A valid registration form with a JPEG photo.
///
/// # Panics
///
/// Panics if the MIME literal is rejected by reqwest.
#[must_use]
pub fn registration_form(full_name: &str, email: &str) -> Form {
    let photo = Part::bytes(TINY_JPEG.to_vec())
        .file_name("document.jpg")
        .mime_str("image/jpeg")
        .expect("valid MIME type");

    Form::new()
        .text("fullName", full_name.to_string())
        .text("email", email.to_string())
        .text("phoneCountryCode", "+54")
        .text("phoneNumber", "1122334455")
        .part("documentPhoto", photo)
}
