//! In-memory patient store for tests.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use patient_registry_core::{
    Email, ListQuery, NewPatient, Patient, PatientId, SortField, SortOrder,
};

use super::{PatientStore, RepositoryError};

/// A [`PatientStore`] that keeps patients in a vector.
///
/// Mirrors the `PostgreSQL` store: exact-email uniqueness, case-insensitive
/// search over name and email, ties broken by id.
#[derive(Debug, Default)]
pub struct InMemoryPatientStore {
    patients: RwLock<Vec<Patient>>,
    unavailable: AtomicBool,
}

impl InMemoryPatientStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make [`PatientStore::ping`] fail, as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Number of stored patients.
    pub async fn len(&self) -> usize {
        self.patients.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.patients.read().await.is_empty()
    }
}

fn compare(a: &Patient, b: &Patient, field: SortField, order: SortOrder) -> Ordering {
    let primary = match field {
        SortField::FullName => a
            .full_name
            .as_str()
            .to_lowercase()
            .cmp(&b.full_name.as_str().to_lowercase()),
        SortField::Email => a
            .email
            .as_str()
            .to_lowercase()
            .cmp(&b.email.as_str().to_lowercase()),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    };

    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };

    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn list(&self, query: &ListQuery) -> Result<(Vec<Patient>, u64), RepositoryError> {
        let patients = self.patients.read().await;

        let mut matched: Vec<Patient> = patients
            .iter()
            .filter(|p| query.matches(p.full_name.as_str()) || query.matches(p.email.as_str()))
            .cloned()
            .collect();
        matched.sort_by(|a, b| compare(a, b, query.sort_by(), query.order()));

        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect();

        Ok((page, total))
    }

    async fn find_by_id(&self, id: PatientId) -> Result<Option<Patient>, RepositoryError> {
        let patients = self.patients.read().await;
        Ok(patients.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Patient>, RepositoryError> {
        let patients = self.patients.read().await;
        Ok(patients.iter().find(|p| p.email == *email).cloned())
    }

    async fn insert(
        &self,
        patient: &NewPatient,
        document_photo_url: &str,
    ) -> Result<Patient, RepositoryError> {
        let mut patients = self.patients.write().await;

        if patients.iter().any(|p| p.email == *patient.email()) {
            return Err(RepositoryError::Conflict(
                "Email already registered".to_string(),
            ));
        }

        let saved = patient.clone().into_patient(
            PatientId::generate(),
            document_photo_url.to_string(),
            Utc::now(),
        );
        patients.push(saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: PatientId) -> Result<bool, RepositoryError> {
        let mut patients = self.patients.write().await;
        let before = patients.len();
        patients.retain(|p| p.id != id);
        Ok(patients.len() < before)
    }

    async fn clear(&self) -> Result<(), RepositoryError> {
        self.patients.write().await.clear();
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use patient_registry_core::{PatientForm, PLACEHOLDER_PHOTO_URL};

    use super::*;

    fn new_patient(name: &str, email: &str) -> NewPatient {
        NewPatient::parse(&PatientForm {
            full_name: Some(name.to_string()),
            email: Some(email.to_string()),
            phone_country_code: Some("+1".to_string()),
            phone_number: Some("5551234567".to_string()),
        })
        .unwrap()
    }

    async fn seeded() -> InMemoryPatientStore {
        let store = InMemoryPatientStore::new();
        for (name, email) in [
            ("Juan Perez", "juan@gmail.com"),
            ("ana lopez", "x.perez@gmail.com"),
            ("Zoe Adams", "zoe@gmail.com"),
        ] {
            store
                .insert(&new_patient(name, email), PLACEHOLDER_PHOTO_URL)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_email() {
        let store = InMemoryPatientStore::new();
        let patient = new_patient("Juan", "juan@gmail.com");

        store.insert(&patient, PLACEHOLDER_PHOTO_URL).await.unwrap();
        let err = store.insert(&patient, PLACEHOLDER_PHOTO_URL).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_search_matches_name_or_email() {
        let store = seeded().await;
        let query = ListQuery::new(
            10,
            0,
            Some("perez".to_string()),
            SortField::FullName,
            SortOrder::Asc,
        )
        .unwrap();

        let (page, total) = store.list(&query).await.unwrap();

        assert_eq!(total, 2);
        let names: Vec<_> = page.iter().map(|p| p.full_name.as_str()).collect();
        assert_eq!(names, ["Ana Lopez", "Juan Perez"]);
    }

    #[tokio::test]
    async fn test_list_paginates_after_sorting() {
        let store = seeded().await;
        let query =
            ListQuery::new(2, 2, None, SortField::Email, SortOrder::Asc).unwrap();

        let (page, total) = store.list(&query).await.unwrap();

        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].email.as_str(), "zoe@gmail.com");
    }

    #[tokio::test]
    async fn test_email_sort_ignores_case() {
        let store = InMemoryPatientStore::new();
        for (name, email) in [("Zed", "Zed@gmail.com"), ("Abe", "abe@gmail.com")] {
            store
                .insert(&new_patient(name, email), PLACEHOLDER_PHOTO_URL)
                .await
                .unwrap();
        }

        let asc = ListQuery::new(10, 0, None, SortField::Email, SortOrder::Asc).unwrap();
        let (page, _) = store.list(&asc).await.unwrap();
        let emails: Vec<_> = page.iter().map(|p| p.email.as_str()).collect();
        assert_eq!(emails, ["abe@gmail.com", "Zed@gmail.com"]);

        let desc = ListQuery::new(10, 0, None, SortField::Email, SortOrder::Desc).unwrap();
        let (page, _) = store.list(&desc).await.unwrap();
        assert_eq!(page[0].email.as_str(), "Zed@gmail.com");
    }

    #[tokio::test]
    async fn test_delete_and_ping() {
        let store = seeded().await;
        let (page, _) = store.list(&ListQuery::default()).await.unwrap();
        let id = page[0].id;

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(store.find_by_id(id).await.unwrap().is_none());

        store.ping().await.unwrap();
        store.set_unavailable(true);
        assert!(store.ping().await.is_err());

        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }
}
