use chrono::Utc;
use serde_json::Value;
use sqlx::Row;

use super::SqliteStore;
use super::mapping::ser;
use crate::repository::{ScratchStore, StorageError};

#[async_trait::async_trait]
impl ScratchStore for SqliteStore {
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&value).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO scratch_entries (key, value, saved_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    saved_at = excluded.saved_at
            ",
        )
        .bind(key)
        .bind(raw)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT value FROM scratch_entries WHERE key = ?1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("value").map_err(ser)?;
                Ok(Some(serde_json::from_str(&raw).map_err(ser)?))
            }
            None => Ok(None),
        }
    }
}
