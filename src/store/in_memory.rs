//! InMemoryProgressStore - BTreeMap-backed progress store for tests and single-process use.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use super::{Changeset, ProgressStore, RecordKey, StoreError, StoredRecord};
use crate::outbox::{OutboxRecord, OutboxStatus, OutboxStore};

#[derive(Default)]
struct State {
    records: BTreeMap<RecordKey, StoredRecord>,
    outbox: Vec<OutboxRecord>,
    outbox_keys: HashSet<String>,
    outbox_seq: u64,
}

/// In-memory progress store. Clone-friendly via `Arc`; clones share state.
///
/// Records and outbox live behind one `RwLock`, so a [`Changeset`] lands in
/// a single write section and readers never observe half of it.
#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all collections.
    pub fn len(&self) -> Result<usize, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(state.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn update_outbox<F>(&self, ids: &[u64], operation: &'static str, mut apply: F) -> Result<(), StoreError>
    where
        F: FnMut(&mut OutboxRecord),
    {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned(operation))?;
        for record in state.outbox.iter_mut() {
            if ids.contains(&record.id) {
                apply(record);
            }
        }
        Ok(())
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn load(&self, key: &RecordKey) -> Result<Option<StoredRecord>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(state.records.get(key).cloned())
    }

    fn scan(
        &self,
        collection: &str,
        user_id: &str,
    ) -> Result<Vec<(RecordKey, StoredRecord)>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        let start = RecordKey::new(collection, user_id, "");
        Ok(state
            .records
            .range(start..)
            .take_while(|(key, _)| key.collection == collection && key.user_id == user_id)
            .map(|(key, stored)| (key.clone(), stored.clone()))
            .collect())
    }

    fn commit(&self, changeset: Changeset) -> Result<(), StoreError> {
        if changeset.is_empty() {
            return Ok(());
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("commit"))?;

        for write in changeset.writes {
            let version = state
                .records
                .get(&write.key)
                .map(|stored| stored.version + 1)
                .unwrap_or(1);
            state.records.insert(
                write.key,
                StoredRecord {
                    bytes: write.bytes,
                    version,
                },
            );
        }

        for message in changeset.outbox {
            if !state.outbox_keys.insert(message.key.clone()) {
                tracing::debug!(key = %message.key, "dropping duplicate outbox message");
                continue;
            }
            state.outbox_seq += 1;
            let id = state.outbox_seq;
            state.outbox.push(OutboxRecord::pending(id, message));
        }

        Ok(())
    }
}

impl OutboxStore for InMemoryProgressStore {
    fn peek_outbox(&self) -> Result<Vec<OutboxRecord>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("outbox read"))?;
        Ok(state.outbox.clone())
    }

    fn claim_outbox(
        &self,
        worker_id: &str,
        max: usize,
        lease: Duration,
    ) -> Result<Vec<OutboxRecord>, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("outbox claim"))?;
        let now = SystemTime::now();
        let locked_until = now.checked_add(lease).unwrap_or(now);

        let mut claimed = Vec::new();
        for record in state.outbox.iter_mut() {
            if claimed.len() >= max {
                break;
            }
            if !record.claimable(now) {
                continue;
            }
            record.status = OutboxStatus::InFlight;
            record.attempts = record.attempts.saturating_add(1);
            record.locked_by = Some(worker_id.to_string());
            record.locked_until = Some(locked_until);
            claimed.push(record.clone());
        }

        Ok(claimed)
    }

    fn complete_outbox(&self, ids: &[u64]) -> Result<(), StoreError> {
        let now = SystemTime::now();
        self.update_outbox(ids, "outbox complete", |record| {
            record.status = OutboxStatus::Published;
            record.published_at = Some(now);
            record.locked_by = None;
            record.locked_until = None;
            record.last_error = None;
        })
    }

    fn release_outbox(&self, ids: &[u64], error: Option<&str>) -> Result<(), StoreError> {
        self.update_outbox(ids, "outbox release", |record| {
            record.status = OutboxStatus::Pending;
            record.locked_by = None;
            record.locked_until = None;
            record.last_error = error.map(str::to_string);
        })
    }

    fn fail_outbox(&self, ids: &[u64], error: Option<&str>) -> Result<(), StoreError> {
        let now = SystemTime::now();
        self.update_outbox(ids, "outbox fail", |record| {
            record.status = OutboxStatus::Failed;
            record.failed_at = Some(now);
            record.locked_by = None;
            record.locked_until = None;
            record.last_error = error.map(str::to_string);
        })
    }
}
