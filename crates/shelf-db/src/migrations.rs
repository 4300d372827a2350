//! # Database Migrations
//!
//! Schema migrations embedded at compile time.
//!
//! ## Directory Structure
//! ```text
//! migrations/sqlite/
//! ├── 001_products.sql      # Product documents
//! ├── 002_transactions.sql  # Completed sales
//! └── 003_audit_log.sql     # Audit trail
//! ```

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending migrations, each in its own transaction.
///
/// Applied migrations are recorded in `_sqlx_migrations`, so repeated calls
/// are no-ops.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// `(embedded, applied)` migration counts, for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // the table does not exist before the first run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
