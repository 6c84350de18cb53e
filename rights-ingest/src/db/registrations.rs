//! Registration audit trail
//!
//! One row per registered asset, written after the ledger confirms. Writes
//! go through `retry_on_lock` so a busy database delays rather than drops
//! the record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rights_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::CanonicalMetadata;
use crate::utils::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};

/// Everything worth keeping about a completed registration
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub asset_id: String,
    pub submission_id: Uuid,
    pub transaction_receipt: String,
    pub network: String,
    pub ip_content_id: String,
    pub ip_content_hash: String,
    pub display_content_id: String,
    pub display_content_hash: String,
    pub metadata: CanonicalMetadata,
    pub registered_at: DateTime<Utc>,
}

/// Destination for audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<()>;
}

/// Audit sink writing to the `registrations` table
#[derive(Clone)]
pub struct SqliteAuditSink {
    pool: SqlitePool,
}

impl SqliteAuditSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        save_registration(&self.pool, record).await
    }
}

/// Insert or replace the row for `record.asset_id`
pub async fn save_registration(pool: &SqlitePool, record: &AuditRecord) -> Result<()> {
    let submission_id = record.submission_id.to_string();
    let metadata = serde_json::to_string(&record.metadata)
        .map_err(|e| Error::Internal(format!("Failed to serialize metadata: {}", e)))?;
    let registered_at = record.registered_at.to_rfc3339();

    retry_on_lock("save_registration", DEFAULT_MAX_LOCK_WAIT_MS, || async {
        sqlx::query(
            r#"
            INSERT INTO registrations (
                asset_id, submission_id, transaction_receipt, network,
                ip_content_id, ip_content_hash, display_content_id, display_content_hash,
                metadata, registered_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(asset_id) DO UPDATE SET
                submission_id = excluded.submission_id,
                transaction_receipt = excluded.transaction_receipt,
                network = excluded.network,
                ip_content_id = excluded.ip_content_id,
                ip_content_hash = excluded.ip_content_hash,
                display_content_id = excluded.display_content_id,
                display_content_hash = excluded.display_content_hash,
                metadata = excluded.metadata,
                registered_at = excluded.registered_at
            "#,
        )
        .bind(&record.asset_id)
        .bind(&submission_id)
        .bind(&record.transaction_receipt)
        .bind(&record.network)
        .bind(&record.ip_content_id)
        .bind(&record.ip_content_hash)
        .bind(&record.display_content_id)
        .bind(&record.display_content_hash)
        .bind(&metadata)
        .bind(&registered_at)
        .execute(pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    })
    .await
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<AuditRecord> {
    let submission_id: String = row.get("submission_id");
    let submission_id = Uuid::parse_str(&submission_id)
        .map_err(|e| Error::Internal(format!("Failed to parse submission_id: {}", e)))?;

    let metadata: String = row.get("metadata");
    let metadata: CanonicalMetadata = serde_json::from_str(&metadata)
        .map_err(|e| Error::Internal(format!("Failed to deserialize metadata: {}", e)))?;

    let registered_at: String = row.get("registered_at");
    let registered_at = DateTime::parse_from_rfc3339(&registered_at)
        .map_err(|e| Error::Internal(format!("Failed to parse registered_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(AuditRecord {
        asset_id: row.get("asset_id"),
        submission_id,
        transaction_receipt: row.get("transaction_receipt"),
        network: row.get("network"),
        ip_content_id: row.get("ip_content_id"),
        ip_content_hash: row.get("ip_content_hash"),
        display_content_id: row.get("display_content_id"),
        display_content_hash: row.get("display_content_hash"),
        metadata,
        registered_at,
    })
}

const SELECT_COLUMNS: &str = r#"
    SELECT asset_id, submission_id, transaction_receipt, network,
           ip_content_id, ip_content_hash, display_content_id, display_content_hash,
           metadata, registered_at
    FROM registrations
"#;

/// Load the row for one asset
pub async fn load_registration(pool: &SqlitePool, asset_id: &str) -> Result<Option<AuditRecord>> {
    let row = sqlx::query(&format!("{} WHERE asset_id = ?", SELECT_COLUMNS))
        .bind(asset_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_record).transpose()
}

/// All registrations made for one submission, oldest first
pub async fn list_registrations(pool: &SqlitePool, submission_id: Uuid) -> Result<Vec<AuditRecord>> {
    let rows = sqlx::query(&format!(
        "{} WHERE submission_id = ? ORDER BY registered_at ASC",
        SELECT_COLUMNS
    ))
    .bind(submission_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn memory_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn record(asset_id: &str, submission_id: Uuid) -> AuditRecord {
        let mut metadata = CanonicalMetadata::default();
        metadata.release.title = "Night Drive".to_string();
        AuditRecord {
            asset_id: asset_id.to_string(),
            submission_id,
            transaction_receipt: "0xtx".to_string(),
            network: "aeneid".to_string(),
            ip_content_id: "ipfs://ip".to_string(),
            ip_content_hash: "aa".to_string(),
            display_content_id: "ipfs://display".to_string(),
            display_content_hash: "bb".to_string(),
            metadata,
            registered_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_registration() {
        let pool = memory_pool().await;
        let submission_id = Uuid::new_v4();
        let saved = record("0xasset", submission_id);

        SqliteAuditSink::new(pool.clone()).record(&saved).await.unwrap();

        let loaded = load_registration(&pool, "0xasset").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(load_registration(&pool, "0xother").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resave_replaces_row() {
        let pool = memory_pool().await;
        let submission_id = Uuid::new_v4();
        let mut saved = record("0xasset", submission_id);
        save_registration(&pool, &saved).await.unwrap();

        saved.transaction_receipt = "0xtx2".to_string();
        save_registration(&pool, &saved).await.unwrap();

        let all = list_registrations(&pool, submission_id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].transaction_receipt, "0xtx2");
    }
}
