//! Database migration command.
//!
//! Applies the migrations embedded in the server crate
//! (`crates/server/migrations/`).
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`, or `DATABASE_HOST`/`DATABASE_PORT`/`DATABASE_USER`/
//!   `DATABASE_PASSWORD`/`DATABASE_NAME`

use thiserror::Error;

use patient_registry_server::config::{ConfigError, database_url_from_env};
use patient_registry_server::db::{MIGRATOR, create_pool};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
