//! Application state shared across handlers.

use std::sync::Arc;

use crate::services::PatientService;
use crate::storage::PhotoStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    patients: PatientService,
    photos: PhotoStore,
}

impl AppState {
    #[must_use]
    pub fn new(patients: PatientService, photos: PhotoStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner { patients, photos }),
        }
    }

    /// Patient operations.
    #[must_use]
    pub fn patients(&self) -> &PatientService {
        &self.inner.patients
    }

    /// Uploaded photo storage.
    #[must_use]
    pub fn photos(&self) -> &PhotoStore {
        &self.inner.photos
    }
}
