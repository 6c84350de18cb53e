//! Database Test Utilities
//!
//! Utilities for audit database testing and schema validation

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Column information from PRAGMA table_info
#[derive(Debug, sqlx::FromRow)]
pub struct ColumnInfo {
    pub cid: i32,
    pub name: String,
    pub r#type: String,
    pub notnull: i32,
    pub dflt_value: Option<String>,
    pub pk: i32,
}

/// Create temporary on-disk audit database with tables initialized
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_rights.db");
    let pool = rights_ingest::db::init_database_pool(&db_path).await?;
    Ok((temp_dir, pool))
}

/// In-memory audit database
///
/// Single connection, since every new `:memory:` connection is a new database.
pub async fn memory_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    rights_ingest::db::init_tables(&pool).await.unwrap();
    pool
}

/// Get table schema information
pub async fn get_table_columns(pool: &SqlitePool, table_name: &str) -> Result<Vec<ColumnInfo>> {
    let query = format!("PRAGMA table_info({})", table_name);
    let columns = sqlx::query_as::<_, ColumnInfo>(&query)
        .fetch_all(pool)
        .await?;
    Ok(columns)
}

/// Check if table has specific column
pub async fn has_column(pool: &SqlitePool, table_name: &str, column_name: &str) -> Result<bool> {
    let columns = get_table_columns(pool, table_name).await?;
    Ok(columns.iter().any(|c| c.name == column_name))
}

/// Assert table has column
pub async fn assert_has_column(pool: &SqlitePool, table_name: &str, column_name: &str) {
    let has = has_column(pool, table_name, column_name)
        .await
        .expect("Failed to check column");
    assert!(
        has,
        "Table '{}' should have column '{}'",
        table_name, column_name
    );
}

/// Count rows in the registrations table
pub async fn registration_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM registrations")
        .fetch_one(pool)
        .await
        .unwrap()
}
