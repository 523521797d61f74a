//! In-process registration events.
//!
//! [`EventBus::publish`] hands the event to every listener on its own tokio
//! task and returns immediately. Listener failures are logged and dropped;
//! there are no retries.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::Instrument;

use patient_registry_core::Patient;

use super::email::EmailError;

/// Emitted after a patient has been saved.
#[derive(Debug, Clone)]
pub struct PatientRegistered {
    pub patient: Patient,
}

impl PatientRegistered {
    /// Event name used in logs.
    pub const NAME: &'static str = "patient.registered";
}

/// Errors a listener may report. They are logged, never surfaced to clients.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Reacts to [`PatientRegistered`] events.
#[async_trait]
pub trait RegistrationListener: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn on_registered(&self, event: &PatientRegistered) -> Result<(), NotificationError>;
}

/// Fan-out of registration events to listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn RegistrationListener>>,
}

impl EventBus {
    /// A bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn RegistrationListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Spawn one task per listener and return without waiting for them.
    pub fn publish(&self, event: PatientRegistered) {
        let event = Arc::new(event);

        for listener in &self.listeners {
            let listener = Arc::clone(listener);
            let event = Arc::clone(&event);
            let span = tracing::info_span!(
                "registration_listener",
                event = PatientRegistered::NAME,
                listener = listener.name(),
                patient_id = %event.patient.id,
            );

            tokio::spawn(
                async move {
                    if let Err(e) = listener.on_registered(&event).await {
                        tracing::error!(
                            patient_id = %event.patient.id,
                            email = %event.patient.email,
                            error = %e,
                            "Registration listener failed"
                        );
                    }
                }
                .instrument(span),
            );
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.listeners.iter().map(|l| l.name()).collect();
        f.debug_struct("EventBus").field("listeners", &names).finish()
    }
}
