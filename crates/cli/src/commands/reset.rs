//! Reset the registry and optionally seed it with mock patients.
//!
//! Truncates the `patients` table and clears the uploads directory (keeping
//! `.gitkeep`). Seeded patients are inserted straight into the store, so no
//! registration emails are sent.
//!
//! # Environment Variables
//!
//! - Database: as for `pr-cli migrate`
//! - `UPLOADS_DIR` - Photo directory (default `uploads`)

use std::collections::HashSet;

use rand::Rng;
use rand::seq::IndexedRandom;

use patient_registry_core::{NewPatient, PLACEHOLDER_PHOTO_URL, PatientForm, ValidationErrors};
use patient_registry_server::config::{database_url_from_env, uploads_dir_from_env};
use patient_registry_server::db::{PatientStore, PgPatientStore, create_pool};
use patient_registry_server::storage::PhotoStore;

/// Patients inserted by `--seed` without `--count`.
pub const DEFAULT_SEED_COUNT: usize = 50;

const GIVEN_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth",
];

const FAMILY_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez",
];

/// Clear everything, then insert `seed` random patients if given.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is unreachable,
/// or the uploads directory cannot be cleared.
pub async fn run(seed: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url_from_env()?;
    let uploads_dir = uploads_dir_from_env();

    let pool = create_pool(&database_url).await?;
    tracing::info!("Connected to database");

    let store = PgPatientStore::new(pool);
    store.clear().await?;
    tracing::info!("Patients table cleared");

    let photos = PhotoStore::new(uploads_dir);
    let removed = photos.clear().await?;
    photos.ensure_dir().await?;
    tracing::info!(removed, dir = %photos.dir().display(), "Uploads cleared");

    let Some(count) = seed else {
        tracing::info!("Skipping seed (use --seed to populate)");
        return Ok(());
    };

    let patients = mock_patients(&mut rand::rng(), count)?;
    for patient in &patients {
        store.insert(patient, PLACEHOLDER_PHOTO_URL).await?;
    }
    tracing::info!(count = patients.len(), "Seeded patients");

    Ok(())
}

/// Generate `count` valid patients with distinct emails.
///
/// # Errors
///
/// Returns `ValidationErrors` if a generated record fails validation.
pub fn mock_patients(
    rng: &mut impl Rng,
    count: usize,
) -> Result<Vec<NewPatient>, ValidationErrors> {
    let mut seen = HashSet::with_capacity(count);
    let mut patients = Vec::with_capacity(count);

    while patients.len() < count {
        let form = mock_form(rng);
        let Some(email) = form.email.clone() else {
            continue;
        };
        if seen.insert(email) {
            patients.push(NewPatient::parse(&form)?);
        }
    }

    Ok(patients)
}

fn mock_form(rng: &mut impl Rng) -> PatientForm {
    let given = GIVEN_NAMES.choose(rng).copied().unwrap_or("James");
    let family = FAMILY_NAMES.choose(rng).copied().unwrap_or("Smith");
    let suffix: u16 = rng.random_range(0..1000);
    let subscriber: u32 = rng.random_range(1_000_000..10_000_000);

    PatientForm {
        full_name: Some(format!("{given} {family}")),
        email: Some(format!(
            "{}.{}{suffix}@gmail.com",
            given.to_lowercase(),
            family.to_lowercase()
        )),
        phone_country_code: Some("+1".to_string()),
        phone_number: Some(format!("555{subscriber}")),
    }
}
