//! Patient persistence.
//!
//! # Tables
//!
//! - `patients` - Registered patients (unique `email`, `updated_at` trigger)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p patient-registry-cli -- migrate
//! ```

#[cfg(test)]
pub mod memory;
pub mod patients;

use std::time::Duration;

use async_trait::async_trait;
use patient_registry_core::{Email, ListQuery, NewPatient, Patient, PatientId};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

#[cfg(test)]
pub use memory::InMemoryPatientStore;
pub use patients::PgPatientStore;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage for patient records.
///
/// The `PostgreSQL` implementation is [`PgPatientStore`]; unit tests use an
/// in-memory store.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// One page of patients matching the query, plus the total match count.
    async fn list(&self, query: &ListQuery) -> Result<(Vec<Patient>, u64), RepositoryError>;

    async fn find_by_id(&self, id: PatientId) -> Result<Option<Patient>, RepositoryError>;

    /// Exact (case-sensitive) email lookup.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Patient>, RepositoryError>;

    /// Persist a new patient. The store assigns `id` and timestamps.
    ///
    /// Returns [`RepositoryError::Conflict`] if the email is already taken.
    async fn insert(
        &self,
        patient: &NewPatient,
        document_photo_url: &str,
    ) -> Result<Patient, RepositoryError>;

    /// Delete a patient. Returns `false` if no row matched.
    async fn delete(&self, id: PatientId) -> Result<bool, RepositoryError>;

    /// Remove every patient.
    async fn clear(&self) -> Result<(), RepositoryError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
