//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! # Apply every pending migration
//! uv-cli migrate run
//!
//! # Revert the most recent migration
//! uv-cli migrate revert
//!
//! # Revert everything newer than a version
//! uv-cli migrate revert --target 20250301000004
//!
//! # List migrations and whether they are applied
//! uv-cli migrate status
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/admin/migrations/` as reversible pairs and are
//! embedded into the binary at compile time:
//! ```text
//! migrations/
//! ├── 20250301000001_create_base_tables.up.sql
//! ├── 20250301000001_create_base_tables.down.sql
//! └── ...
//! ```

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::{Migrate, Migrator};

/// Migrations embedded from the admin crate.
static MIGRATOR: Migrator = sqlx::migrate!("../admin/migrations");

/// Errors from migration commands.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Nothing to revert: no migrations are applied")]
    NothingApplied,
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running admin migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}

/// Revert applied migrations newer than `target`.
///
/// Without a target, only the most recently applied migration is reverted.
///
/// # Errors
///
/// Returns an error if nothing is applied, the database is unreachable, or a
/// down migration fails.
pub async fn revert(target: Option<i64>) -> Result<(), MigrationError> {
    let pool = connect().await?;

    let target = match target {
        Some(version) => version,
        None => {
            let applied = applied_versions(&pool).await?;
            previous_version(&applied).ok_or(MigrationError::NothingApplied)?
        }
    };

    tracing::info!(target, "Reverting admin migrations...");
    MIGRATOR.undo(&pool, target).await?;

    tracing::info!(target, "Revert complete");
    Ok(())
}

/// Print every embedded migration with its state.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn status() -> Result<(), MigrationError> {
    let pool = connect().await?;

    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;
    let applied: HashMap<i64, Vec<u8>> = conn
        .list_applied_migrations()
        .await?
        .into_iter()
        .map(|m| (m.version, m.checksum.into_owned()))
        .collect();

    for migration in MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
    {
        let state = match applied.get(&migration.version) {
            None => MigrationState::Pending,
            Some(checksum) if checksum.as_slice() == &*migration.checksum => {
                MigrationState::Applied
            }
            Some(_) => MigrationState::ChecksumMismatch,
        };

        if state == MigrationState::ChecksumMismatch {
            tracing::warn!(
                version = migration.version,
                "applied migration differs from the embedded file"
            );
        }

        #[allow(clippy::print_stdout)]
        {
            println!(
                "{:<16} {:<10} {}",
                migration.version,
                state.label(),
                migration.description
            );
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MigrationState {
    Applied,
    Pending,
    ChecksumMismatch,
}

impl MigrationState {
    const fn label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Pending => "pending",
            Self::ChecksumMismatch => "MODIFIED",
        }
    }
}

/// Connect using `ADMIN_DATABASE_URL`, or `DATABASE_URL` when unset.
async fn connect() -> Result<PgPool, MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to admin database...");
    Ok(PgPool::connect(database_url.expose_secret()).await?)
}

async fn applied_versions(pool: &PgPool) -> Result<Vec<i64>, MigrationError> {
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;
    Ok(conn
        .list_applied_migrations()
        .await?
        .into_iter()
        .map(|m| m.version)
        .collect())
}

/// Version to revert to so that exactly the latest applied migration is
/// undone. `Some(0)` when only one migration is applied.
fn previous_version(applied: &[i64]) -> Option<i64> {
    let mut versions = applied.to_vec();
    versions.sort_unstable();
    versions.pop()?;
    Some(versions.last().copied().unwrap_or(0))
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_version_nothing_applied() {
        assert_eq!(previous_version(&[]), None);
    }

    #[test]
    fn test_previous_version_single() {
        assert_eq!(previous_version(&[20_250_301_000_001]), Some(0));
    }

    #[test]
    fn test_previous_version_unordered() {
        assert_eq!(
            previous_version(&[20_250_301_000_003, 20_250_301_000_001, 20_250_301_000_002]),
            Some(20_250_301_000_002)
        );
    }

    #[test]
    fn test_embedded_migrations_are_reversible() {
        let ups: Vec<_> = MIGRATOR
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .map(|m| m.version)
            .collect();
        let downs: Vec<_> = MIGRATOR
            .iter()
            .filter(|m| m.migration_type.is_down_migration())
            .map(|m| m.version)
            .collect();

        assert_eq!(ups.len(), 8);
        assert_eq!(ups, downs);
        assert!(ups.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
