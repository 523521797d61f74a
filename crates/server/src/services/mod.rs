//! Business logic services.
//!
//! # Services
//!
//! - `patients` - Registration, lookup, listing and removal
//! - `events` - In-process `patient.registered` fan-out
//! - `email` - Registration confirmation via SMTP

pub mod email;
pub mod events;
pub mod patients;

pub use email::{
    EmailError, MailTransport, OutgoingEmail, RegistrationEmailListener, SmtpMailer,
    registration_email,
};
pub use events::{EventBus, NotificationError, PatientRegistered, RegistrationListener};
pub use patients::PatientService;
