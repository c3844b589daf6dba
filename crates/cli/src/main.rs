//! Univendor CLI - Database migration tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! uv-cli migrate run
//!
//! # Revert the last applied migration
//! uv-cli migrate revert
//!
//! # Revert down to (but not including) a version
//! uv-cli migrate revert --target 20250301000004
//!
//! # Show applied and pending migrations
//! uv-cli migrate status
//! ```
//!
//! # Commands
//!
//! - `migrate run` - Apply pending migrations
//! - `migrate revert` - Run down migrations
//! - `migrate status` - List migrations and checksum mismatches

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "uv-cli")]
#[command(author, version, about = "Univendor CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply every pending migration
    Run,
    /// Revert applied migrations
    Revert {
        /// Revert every migration newer than this version (default: the last one only)
        #[arg(short, long)]
        target: Option<i64>,
    },
    /// List migrations and whether they are applied
    Status,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::migrate::MigrationError> {
    match cli.command {
        Commands::Migrate { action } => match action {
            MigrateAction::Run => commands::migrate::run().await?,
            MigrateAction::Revert { target } => commands::migrate::revert(target).await?,
            MigrateAction::Status => commands::migrate::status().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_revert_target() {
        let cli = Cli::try_parse_from(["uv-cli", "migrate", "revert", "--target", "20250301000004"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Migrate {
                action: MigrateAction::Revert {
                    target: Some(20_250_301_000_004)
                }
            }
        ));
    }
}
