use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::repository::{SlotRecord, SlotRepository, StateSlot, StorageError};

use super::SqliteRepository;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl SlotRepository for SqliteRepository {
    async fn read(&self, slot: StateSlot) -> Result<Option<SlotRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT value, updated_at
            FROM state_slots
            WHERE key = ?1
            ",
        )
        .bind(slot.key())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row.try_get("value").map_err(ser)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;

        Ok(Some(SlotRecord {
            slot,
            value,
            updated_at,
        }))
    }

    async fn write(
        &self,
        slot: StateSlot,
        value: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO state_slots (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(slot.key())
        .bind(value)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
