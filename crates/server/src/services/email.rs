//! Registration confirmation email.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain-text templates.
//! The transport sits behind [`MailTransport`] so listeners can be exercised
//! without an SMTP server.

use std::sync::Arc;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use patient_registry_core::Patient;

use super::events::{NotificationError, PatientRegistered, RegistrationListener};
use crate::config::MailConfig;

/// Subject line of the registration confirmation.
pub const REGISTRATION_SUBJECT: &str = "Registration Successful - Welcome!";

/// HTML template for the registration confirmation.
#[derive(Template)]
#[template(path = "email/patient_registered.html")]
struct PatientRegisteredHtml<'a> {
    full_name: &'a str,
    email: &'a str,
    phone: &'a str,
    registration_date: &'a str,
}

/// Plain text template for the registration confirmation.
#[derive(Template)]
#[template(path = "email/patient_registered.txt")]
struct PatientRegisteredText<'a> {
    full_name: &'a str,
    email: &'a str,
    phone: &'a str,
    registration_date: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Delivers rendered messages.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// SMTP mail transport.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Create a new SMTP transport from configuration.
    ///
    /// Without STARTTLS the connection is plaintext, which suits local mail
    /// catchers such as `MailHog` on port 1025.
    ///
    /// # Errors
    ///
    /// Returns error if the sender address is invalid or the relay cannot be
    /// configured.
    pub fn new(config: &MailConfig) -> Result<Self, EmailError> {
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|_| EmailError::InvalidAddress(config.from_address.clone()))?;

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        .port(config.port);

        if let Some(credentials) = &config.credentials {
            builder = builder.credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email
                .to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(email.to.clone()))?)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?;

        self.mailer.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

/// Human-readable registration date, e.g. `October 16, 2026`.
#[must_use]
pub fn format_registration_date(patient: &Patient) -> String {
    patient.created_at.format("%B %-d, %Y").to_string()
}

/// Render the registration confirmation for a patient.
///
/// # Errors
///
/// Returns `EmailError::Template` if a template fails to render.
pub fn registration_email(patient: &Patient) -> Result<OutgoingEmail, EmailError> {
    let phone = patient.full_phone_number();
    let registration_date = format_registration_date(patient);

    let html = PatientRegisteredHtml {
        full_name: patient.full_name.as_str(),
        email: patient.email.as_str(),
        phone: &phone,
        registration_date: &registration_date,
    }
    .render()?;
    let text = PatientRegisteredText {
        full_name: patient.full_name.as_str(),
        email: patient.email.as_str(),
        phone: &phone,
        registration_date: &registration_date,
    }
    .render()?;

    Ok(OutgoingEmail {
        to: patient.email.to_string(),
        subject: REGISTRATION_SUBJECT.to_string(),
        text,
        html,
    })
}

/// Sends the confirmation email when a patient registers.
pub struct RegistrationEmailListener {
    transport: Arc<dyn MailTransport>,
}

impl RegistrationEmailListener {
    #[must_use]
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl RegistrationListener for RegistrationEmailListener {
    fn name(&self) -> &'static str {
        "registration_email"
    }

    async fn on_registered(&self, event: &PatientRegistered) -> Result<(), NotificationError> {
        let email = registration_email(&event.patient)?;
        self.transport.send(&email).await?;
        Ok(())
    }
}
