//! # Catalog Migrations
//!
//! SQL files in `migrations/sqlite/` are compiled into the binary, so a
//! catalog server never needs the source tree to open a fresh database.
//!
//! New schema changes go in a new `NNN_description.sql`; applied files are
//! checksummed by sqlx and must not be edited.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Known vs applied migration counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub known: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.known
    }
}

/// Applies every pending migration. Safe to call on an up-to-date database.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    for migration in MIGRATOR.iter() {
        debug!(version = migration.version, name = %migration.description, "Known migration");
    }

    MIGRATOR.run(pool).await?;

    let status = migration_status(pool).await?;
    info!(applied = status.applied, "Catalog schema up to date");
    Ok(())
}

pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok(MigrationStatus {
        known: MIGRATOR.iter().count(),
        applied: applied.max(0) as usize,
    })
}
