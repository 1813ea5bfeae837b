use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use formation_progress::outbox::OutboxRecord;
use formation_progress::store::{Changeset, RecordKey, StoredRecord};
use formation_progress::{
    InMemoryProgressStore, OutboxStore, ProgressEngine, ProgressError, ProgressStore, StoreError,
};

use crate::support::{chain_catalog, scenario_catalog};

/// Store whose commits can be switched to fail.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryProgressStore,
    failing: AtomicBool,
}

impl FlakyStore {
    fn fail_commits(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ProgressStore for FlakyStore {
    fn load(&self, key: &RecordKey) -> Result<Option<StoredRecord>, StoreError> {
        self.inner.load(key)
    }

    fn scan(&self, collection: &str, user_id: &str) -> Result<Vec<(RecordKey, StoredRecord)>, StoreError> {
        self.inner.scan(collection, user_id)
    }

    fn commit(&self, changeset: Changeset) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Storage("connection reset".into()));
        }
        self.inner.commit(changeset)
    }
}

impl OutboxStore for FlakyStore {
    fn peek_outbox(&self) -> Result<Vec<OutboxRecord>, StoreError> {
        self.inner.peek_outbox()
    }

    fn claim_outbox(&self, worker_id: &str, max: usize, lease: Duration) -> Result<Vec<OutboxRecord>, StoreError> {
        self.inner.claim_outbox(worker_id, max, lease)
    }

    fn complete_outbox(&self, ids: &[u64]) -> Result<(), StoreError> {
        self.inner.complete_outbox(ids)
    }

    fn release_outbox(&self, ids: &[u64], error: Option<&str>) -> Result<(), StoreError> {
        self.inner.release_outbox(ids, error)
    }

    fn fail_outbox(&self, ids: &[u64], error: Option<&str>) -> Result<(), StoreError> {
        self.inner.fail_outbox(ids, error)
    }
}

#[test]
fn failed_commit_leaves_no_partial_cascade() {
    let engine = ProgressEngine::new(FlakyStore::default(), chain_catalog());
    engine.record_watch_time("u1", "x1", 100.0).unwrap();
    engine.record_watch_time("u1", "x2", 100.0).unwrap();

    engine.store().fail_commits(true);
    let err = engine.record_watch_time("u1", "x3", 100.0).unwrap_err();
    assert!(matches!(err, ProgressError::Store(_)));
    assert_eq!(err.status_code(), 500);

    assert!(engine.content_progress("u1", "x3").unwrap().is_none());
    assert!(engine.chapter_progress("u1", "m1-ch").unwrap().is_none());
    assert!(engine.module_progress("u1", "m1").unwrap().is_none());
    assert!(engine.store().peek_outbox().unwrap().is_empty());

    engine.store().fail_commits(false);
    engine.record_watch_time("u1", "x3", 100.0).unwrap();
    assert!(engine.module_progress("u1", "m1").unwrap().unwrap().is_completed);
    assert_eq!(engine.store().peek_outbox().unwrap().len(), 1);
}

#[test]
fn failed_quiz_commit_keeps_the_quiz_open() {
    let engine = ProgressEngine::new(FlakyStore::default(), scenario_catalog());
    engine.store().fail_commits(true);
    assert!(engine
        .submit_quiz("u1", "q2", crate::support::quiz_answers(5))
        .is_err());

    engine.store().fail_commits(false);
    assert!(engine.quiz_result("u1", "q2").unwrap().is_none());
    assert!(engine.submit_quiz("u1", "q2", crate::support::quiz_answers(5)).unwrap().passed);
}
