//! Patient Registry CLI - Database migrations and maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pr-cli migrate
//!
//! # Delete every patient and stored photo
//! pr-cli reset
//!
//! # Reset, then insert 50 random patients
//! pr-cli reset --seed
//!
//! # Reset, then insert 200 random patients
//! pr-cli reset --seed --count 200
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pr-cli")]
#[command(author, version, about = "Patient registry CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Delete all patients and uploaded photos
    Reset {
        /// Insert random patients afterwards
        #[arg(long)]
        seed: bool,

        /// Number of patients to insert with --seed
        #[arg(long, default_value_t = commands::reset::DEFAULT_SEED_COUNT)]
        count: usize,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Reset { seed, count } => {
            commands::reset::run(seed.then_some(count)).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_reset_defaults() {
        let cli = Cli::try_parse_from(["pr-cli", "reset", "--seed"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Reset { seed: true, count: 50 }
        ));
    }
}
