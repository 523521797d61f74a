//! Patient registration, lookup, listing and removal.

use std::sync::Arc;

use tracing::instrument;

use patient_registry_core::{
    ListQuery, NewPatient, PLACEHOLDER_PHOTO_URL, Page, Patient, PatientId,
};

use super::events::{EventBus, PatientRegistered};
use crate::db::{PatientStore, RepositoryError};
use crate::error::AppError;

const EMAIL_TAKEN: &str = "Email already registered";

/// Patient operations on top of a [`PatientStore`].
#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn PatientStore>,
    events: EventBus,
}

impl PatientService {
    #[must_use]
    pub fn new(store: Arc<dyn PatientStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// One page of patients with pagination metadata.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Patient>, AppError> {
        let (patients, total) = self.store.list(query).await?;
        Ok(Page::new(patients, total, query))
    }

    /// Fetch one patient by its id as sent by the client.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the id is not a UUID or no patient has it.
    #[instrument(skip(self))]
    pub async fn find_one(&self, id: &str) -> Result<Patient, AppError> {
        let patient_id = parse_id(id)?;
        self.store
            .find_by_id(patient_id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Register a patient.
    ///
    /// Publishes [`PatientRegistered`] once saved; listeners run in the
    /// background and cannot affect the result.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if the email is already registered, or
    /// `AppError::Database` if the store fails.
    #[instrument(skip(self, patient), fields(email = %patient.email()))]
    pub async fn create(
        &self,
        patient: NewPatient,
        document_photo_url: Option<String>,
    ) -> Result<Patient, AppError> {
        if self.store.find_by_email(patient.email()).await?.is_some() {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let photo_url = document_photo_url.unwrap_or_else(|| PLACEHOLDER_PHOTO_URL.to_string());
        let saved = match self.store.insert(&patient, &photo_url).await {
            Ok(saved) => saved,
            Err(RepositoryError::Conflict(_)) => {
                return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(patient_id = %saved.id, "Patient registered");
        self.events.publish(PatientRegistered {
            patient: saved.clone(),
        });

        Ok(saved)
    }

    /// Delete a patient.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the id is unknown, including when a
    /// concurrent delete removed it first.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        let patient_id = parse_id(id)?;

        if self.store.find_by_id(patient_id).await?.is_none()
            || !self.store.delete(patient_id).await?
        {
            return Err(not_found(id));
        }

        tracing::info!(patient_id = %patient_id, "Patient removed");
        Ok(())
    }

    /// Check the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store cannot be reached.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.store.ping().await?;
        Ok(())
    }
}

fn parse_id(id: &str) -> Result<PatientId, AppError> {
    id.parse().map_err(|_| not_found(id))
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Patient with ID {id} not found"))
}
