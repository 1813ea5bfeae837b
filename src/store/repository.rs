//! RecordRepository - typed accessor over a [`ProgressStore`].

use std::marker::PhantomData;

use super::{decode, encode, Changeset, ProgressStore, Record, RecordKey, StagedWrite, StoreError, Versioned};

/// Typed view of one record collection.
pub struct RecordRepository<'a, S, R> {
    store: &'a S,
    _marker: PhantomData<R>,
}

impl<'a, S: ProgressStore, R: Record> RecordRepository<'a, S, R> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Get the record for `(user_id, entity_id)`.
    pub fn get(&self, user_id: &str, entity_id: &str) -> Result<Option<Versioned<R>>, StoreError> {
        match self.store.load(&RecordKey::of::<R>(user_id, entity_id))? {
            Some(stored) => Ok(Some(Versioned {
                data: decode(&stored.bytes)?,
                version: stored.version,
            })),
            None => Ok(None),
        }
    }

    /// All records of this collection for one user.
    pub fn for_user(&self, user_id: &str) -> Result<Vec<Versioned<R>>, StoreError> {
        self.store
            .scan(R::COLLECTION, user_id)?
            .into_iter()
            .map(|(_, stored)| {
                Ok(Versioned {
                    data: decode(&stored.bytes)?,
                    version: stored.version,
                })
            })
            .collect()
    }

    /// Upsert a single record in its own commit.
    pub fn upsert(&self, record: &R) -> Result<(), StoreError> {
        self.store.commit(Changeset {
            writes: vec![StagedWrite {
                key: record.record_key(),
                bytes: encode(record)?,
            }],
            outbox: Vec::new(),
        })
    }
}

/// Extension trait for typed record access on any [`ProgressStore`].
pub trait RecordsExt: ProgressStore + Sized {
    fn records<R: Record>(&self) -> RecordRepository<'_, Self, R> {
        RecordRepository::new(self)
    }
}

impl<S: ProgressStore> RecordsExt for S {}
