//! Database access for rights-ingest
//!
//! SQLite holds the audit trail of completed registrations.

pub mod registrations;

pub use registrations::{
    list_registrations, load_registration, save_registration, AuditRecord, AuditSink,
    SqliteAuditSink,
};

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (creating if needed) the database file and ensure tables exist
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the service's tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS registrations (
            asset_id TEXT PRIMARY KEY,
            submission_id TEXT NOT NULL,
            transaction_receipt TEXT NOT NULL,
            network TEXT NOT NULL,
            ip_content_id TEXT NOT NULL,
            ip_content_hash TEXT NOT NULL,
            display_content_id TEXT NOT NULL,
            display_content_hash TEXT NOT NULL,
            metadata TEXT NOT NULL,
            registered_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_registrations_submission ON registrations(submission_id)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (registrations)");

    Ok(())
}
