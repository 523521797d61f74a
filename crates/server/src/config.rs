//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Database
//! - `DATABASE_URL` - `PostgreSQL` connection string. When absent, the URL is
//!   composed from the variables below.
//! - `DATABASE_HOST` - (default: localhost)
//! - `DATABASE_PORT` - (default: 5432)
//! - `DATABASE_USER` - (default: `patient_app`)
//! - `DATABASE_PASSWORD` - Required when `DATABASE_URL` is not set
//! - `DATABASE_NAME` - (default: `patient_registration`)
//!
//! ## Server
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `UPLOADS_DIR` - Directory for document photos (default: uploads)
//! - `CORS_ORIGINS` - Comma-separated allowed origins
//!   (default: `http://localhost:5173,http://localhost:3001`)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//!
//! ## Mail
//! - `MAIL_HOST` - SMTP server hostname (default: localhost)
//! - `MAIL_PORT` - SMTP port (default: 1025)
//! - `MAIL_USER` / `MAIL_PASS` - SMTP credentials (optional, set both or neither)
//! - `MAIL_FROM` - Sender address (default: noreply@patientapp.com)
//! - `MAIL_STARTTLS` - Use STARTTLS (default: false)
//!
//! ## Error tracking
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3001"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Where uploaded document photos are written
    pub uploads_dir: PathBuf,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Outgoing mail configuration
    pub mail: MailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP server hostname
    pub host: String,
    /// SMTP server port
    pub port: u16,
    /// Optional SMTP authentication
    pub credentials: Option<MailCredentials>,
    /// Sender address (From header)
    pub from_address: String,
    /// Upgrade the connection with STARTTLS
    pub starttls: bool,
}

/// SMTP username and password.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct MailCredentials {
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl MailConfig {
    fn from_lookup(env: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let credentials = match (
            get_optional_env(env, "MAIL_USER"),
            get_optional_env(env, "MAIL_PASS"),
        ) {
            (Some(username), Some(password)) => Some(MailCredentials {
                username,
                password: SecretString::from(password),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "MAIL_*".to_string(),
                    "Both MAIL_USER and MAIL_PASS must be set together".to_string(),
                ));
            }
        };

        Ok(Self {
            host: get_env_or_default(env, "MAIL_HOST", "localhost"),
            port: parse_env(env, "MAIL_PORT", "1025")?,
            credentials,
            from_address: get_env_or_default(env, "MAIL_FROM", "noreply@patientapp.com"),
            starttls: parse_env(env, "MAIL_STARTTLS", "false")?,
        })
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = database_url(&env)?;
        let host = parse_env(&env, "HOST", "127.0.0.1")?;
        let port = parse_env(&env, "PORT", "3000")?;
        let uploads_dir = uploads_dir(&env);
        let cors_origins = get_optional_env(&env, "CORS_ORIGINS").map_or_else(
            || DEFAULT_CORS_ORIGINS.iter().map(ToString::to_string).collect(),
            |raw| parse_origins(&raw),
        );
        let log_json = get_optional_env(&env, "LOG_FORMAT")
            .is_some_and(|format| format.eq_ignore_ascii_case("json"));
        let mail = MailConfig::from_lookup(&env)?;
        let sentry_dsn = get_optional_env(&env, "SENTRY_DSN");
        let sentry_environment = get_optional_env(&env, "SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env(&env, "SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env(&env, "SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            uploads_dir,
            cors_origins,
            log_json,
            mail,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Resolve only the database URL (used by the CLI, which needs nothing else).
///
/// # Errors
///
/// Returns `ConfigError` if neither `DATABASE_URL` nor `DATABASE_PASSWORD` is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    database_url(&|key: &str| std::env::var(key).ok())
}

/// Resolve only the uploads directory (used by the CLI reset command).
#[must_use]
pub fn uploads_dir_from_env() -> PathBuf {
    let _ = dotenvy::dotenv();
    uploads_dir(&|key: &str| std::env::var(key).ok())
}

fn uploads_dir(env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    PathBuf::from(get_env_or_default(env, "UPLOADS_DIR", "uploads"))
}

/// `DATABASE_URL`, or a URL composed from the individual `DATABASE_*` parts.
fn database_url(env: &impl Fn(&str) -> Option<String>) -> Result<SecretString, ConfigError> {
    if let Some(url) = get_optional_env(env, "DATABASE_URL") {
        return Ok(SecretString::from(url));
    }

    let host = get_env_or_default(env, "DATABASE_HOST", "localhost");
    let port: u16 = parse_env(env, "DATABASE_PORT", "5432")?;
    let user = get_env_or_default(env, "DATABASE_USER", "patient_app");
    let password = get_required_env(env, "DATABASE_PASSWORD")?;
    let name = get_env_or_default(env, "DATABASE_NAME", "patient_registration");

    Ok(SecretString::from(format!(
        "postgres://{}:{}@{host}:{port}/{name}",
        urlencoding::encode(&user),
        urlencoding::encode(&password),
    )))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

/// Get a required environment variable.
fn get_required_env(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    get_optional_env(env, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional_env(env, key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(env, key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
