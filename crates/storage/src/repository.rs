use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Independent durable slots for learner state.
///
/// Each slot holds one text value and is written whole on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateSlot {
    /// JSON snapshot of the progress store.
    Progress,
    /// `"true"` / `"false"` premium flag.
    Entitlement,
}

impl StateSlot {
    pub const ALL: [StateSlot; 2] = [StateSlot::Progress, StateSlot::Entitlement];

    /// Storage key of the slot.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            StateSlot::Progress => "prompt-master-progress",
            StateSlot::Entitlement => "prompt-master-premium",
        }
    }

}

impl fmt::Display for StateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Persisted value of a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub slot: StateSlot,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Repository contract for the learner state slots.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Fetch the current value of a slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. A slot that was
    /// never written is `Ok(None)`.
    async fn read(&self, slot: StateSlot) -> Result<Option<SlotRecord>, StorageError>;

    /// Replace the value of a slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn write(
        &self,
        slot: StateSlot,
        value: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    slots: Arc<Mutex<HashMap<StateSlot, SlotRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots written so far.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl SlotRepository for InMemoryRepository {
    async fn read(&self, slot: StateSlot) -> Result<Option<SlotRecord>, StorageError> {
        let guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&slot).cloned())
    }

    async fn write(
        &self,
        slot: StateSlot,
        value: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            slot,
            SlotRecord {
                slot,
                value: value.to_owned(),
                updated_at: at,
            },
        );
        Ok(())
    }
}

/// Learner-state storage behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub slots: Arc<dyn SlotRepository>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn unwritten_slots_read_as_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.read(StateSlot::Progress).await.unwrap().is_none());
        assert_eq!(repo.len().unwrap(), 0);
    }

    #[tokio::test]
    async fn writes_replace_the_previous_value() {
        let repo = InMemoryRepository::new();
        repo.write(StateSlot::Entitlement, "false", at(10))
            .await
            .unwrap();
        repo.write(StateSlot::Entitlement, "true", at(20))
            .await
            .unwrap();

        let record = repo.read(StateSlot::Entitlement).await.unwrap().unwrap();
        assert_eq!(record.value, "true");
        assert_eq!(record.updated_at, at(20));
        assert!(repo.read(StateSlot::Progress).await.unwrap().is_none());
    }

    #[test]
    fn slot_keys_are_distinct() {
        assert_eq!(StateSlot::Progress.key(), "prompt-master-progress");
        assert_eq!(StateSlot::Entitlement.to_string(), "prompt-master-premium");
    }
}
