//! Progress Store - per-user records keyed by `(user_id, entity_id)`.
//!
//! Records are serialized to JSON and written through [`ProgressStore::commit`],
//! which applies a whole [`Changeset`] (record upserts plus outbox messages)
//! atomically. There is no separate insert path: every write is an upsert on
//! the composite key, so duplicate requests never trip a uniqueness error.
//!
//! ## Example
//!
//! ```
//! use formation_progress::progress::ContentProgress;
//! use formation_progress::store::{InMemoryProgressStore, RecordsExt};
//!
//! let store = InMemoryProgressStore::new();
//! let progress = ContentProgress::new("user-1", "video-1");
//! store.records::<ContentProgress>().upsert(&progress).unwrap();
//!
//! let loaded = store.records::<ContentProgress>().get("user-1", "video-1").unwrap();
//! assert_eq!(loaded.unwrap().version, 1);
//! ```

mod cached;
mod in_memory;
mod repository;
mod unit_of_work;

use std::collections::BTreeSet;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::outbox::OutboxMessage;

pub use cached::{CacheStats, CachedProgressStore};
pub use in_memory::InMemoryProgressStore;
pub use repository::{RecordRepository, RecordsExt};
pub use unit_of_work::UnitOfWork;

/// A per-user progress record.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Collection name: a table in SQL, a key prefix in a KV store.
    const COLLECTION: &'static str;

    fn user_id(&self) -> &str;

    /// The content, chapter, module or quiz id this record tracks.
    fn entity_id(&self) -> &str;

    fn record_key(&self) -> RecordKey {
        RecordKey::new(Self::COLLECTION, self.user_id(), self.entity_id())
    }
}

/// Composite unique key of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub collection: String,
    pub user_id: String,
    pub entity_id: String,
}

impl RecordKey {
    pub fn new(collection: &str, user_id: &str, entity_id: &str) -> Self {
        Self {
            collection: collection.to_string(),
            user_id: user_id.to_string(),
            entity_id: entity_id.to_string(),
        }
    }

    pub fn of<R: Record>(user_id: &str, entity_id: &str) -> Self {
        Self::new(R::COLLECTION, user_id, entity_id)
    }
}

/// Serialized record bytes plus the write counter the store keeps for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub bytes: Vec<u8>,
    pub version: u64,
}

/// A decoded record with its store version.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

/// Error type for progress store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("record serialization error: {0}")]
    Serde(String),
    #[error("store error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// A staged record upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedWrite {
    pub key: RecordKey,
    pub bytes: Vec<u8>,
}

/// Everything one unit of work wants to persist, applied all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    pub writes: Vec<StagedWrite>,
    pub outbox: Vec<OutboxMessage>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.outbox.is_empty()
    }

    /// Users whose records this changeset writes.
    pub fn users(&self) -> BTreeSet<String> {
        self.writes.iter().map(|w| w.key.user_id.clone()).collect()
    }
}

/// Storage backend for progress records.
///
/// `commit` must be atomic: a failure leaves no staged write or outbox
/// message behind. Implementations map onto a relational store with unique
/// composite keys and `INSERT .. ON CONFLICT DO UPDATE` inside a transaction.
pub trait ProgressStore: Send + Sync {
    fn load(&self, key: &RecordKey) -> Result<Option<StoredRecord>, StoreError>;

    /// All records of one collection belonging to one user.
    fn scan(
        &self,
        collection: &str,
        user_id: &str,
    ) -> Result<Vec<(RecordKey, StoredRecord)>, StoreError>;

    fn commit(&self, changeset: Changeset) -> Result<(), StoreError>;
}

pub(crate) fn encode<R: Record>(record: &R) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(record)?)
}

pub(crate) fn decode<R: Record>(bytes: &[u8]) -> Result<R, StoreError> {
    Ok(serde_json::from_slice(bytes)?)
}
