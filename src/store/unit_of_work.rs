//! UnitOfWork - staged record upserts and outbox messages committed together.
//!
//! ```
//! use formation_progress::progress::ChapterProgress;
//! use formation_progress::store::{InMemoryProgressStore, RecordsExt, UnitOfWork};
//!
//! let store = InMemoryProgressStore::new();
//! let mut uow = UnitOfWork::new(&store);
//! uow.upsert(&ChapterProgress::completed("user-1", "chapter-1")).unwrap();
//!
//! // Staged writes are visible inside the unit of work only.
//! assert!(uow.get::<ChapterProgress>("user-1", "chapter-1").unwrap().is_some());
//! assert!(store.records::<ChapterProgress>().get("user-1", "chapter-1").unwrap().is_none());
//!
//! uow.commit().unwrap();
//! assert!(store.records::<ChapterProgress>().get("user-1", "chapter-1").unwrap().is_some());
//! ```

use std::collections::BTreeMap;

use super::{decode, encode, Changeset, ProgressStore, Record, RecordKey, StagedWrite, StoreError};
use crate::outbox::OutboxMessage;

/// Read-your-writes buffer over a [`ProgressStore`].
///
/// Reads consult staged writes first, then the store. Nothing reaches the
/// store until [`UnitOfWork::commit`]; dropping the unit of work discards
/// every staged write, which is how a failed cascade rolls back.
pub struct UnitOfWork<'a, S> {
    store: &'a S,
    staged: BTreeMap<RecordKey, Vec<u8>>,
    outbox: Vec<OutboxMessage>,
}

impl<'a, S: ProgressStore> UnitOfWork<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            staged: BTreeMap::new(),
            outbox: Vec::new(),
        }
    }

    pub fn get<R: Record>(&self, user_id: &str, entity_id: &str) -> Result<Option<R>, StoreError> {
        let key = RecordKey::of::<R>(user_id, entity_id);
        if let Some(bytes) = self.staged.get(&key) {
            return decode(bytes).map(Some);
        }
        match self.store.load(&key)? {
            Some(stored) => decode(&stored.bytes).map(Some),
            None => Ok(None),
        }
    }

    /// All records of `R` for one user, staged writes overriding stored ones.
    pub fn for_user<R: Record>(&self, user_id: &str) -> Result<Vec<R>, StoreError> {
        let mut merged: BTreeMap<RecordKey, Vec<u8>> = self
            .store
            .scan(R::COLLECTION, user_id)?
            .into_iter()
            .map(|(key, stored)| (key, stored.bytes))
            .collect();
        for (key, bytes) in &self.staged {
            if key.collection == R::COLLECTION && key.user_id == user_id {
                merged.insert(key.clone(), bytes.clone());
            }
        }
        merged.values().map(|bytes| decode(bytes)).collect()
    }

    pub fn upsert<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        self.staged.insert(record.record_key(), encode(record)?);
        Ok(())
    }

    pub fn enqueue(&mut self, message: OutboxMessage) {
        self.outbox.push(message);
    }

    pub fn staged_outbox(&self) -> &[OutboxMessage] {
        &self.outbox
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.outbox.is_empty()
    }

    /// Hand every staged write and message to the store in one atomic commit.
    pub fn commit(self) -> Result<(), StoreError> {
        let changeset = Changeset {
            writes: self
                .staged
                .into_iter()
                .map(|(key, bytes)| StagedWrite { key, bytes })
                .collect(),
            outbox: self.outbox,
        };
        self.store.commit(changeset)
    }
}
