#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{InMemoryRepository, SlotRecord, SlotRepository, StateSlot, Storage, StorageError};
