use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use super::{Lock, LockError, LockManager};

fn poisoned<T>(err: PoisonError<T>) -> LockError {
    LockError::Poisoned(err.to_string())
}

/// Blocking lock: a `held` flag plus a condvar signalled on release.
#[derive(Default)]
pub struct InMemoryLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Lock for InMemoryLock {
    fn lock(&self) -> Result<(), LockError> {
        let held = self.held.lock().map_err(poisoned)?;
        let mut held = self
            .released
            .wait_while(held, |held| *held)
            .map_err(poisoned)?;
        *held = true;
        Ok(())
    }

    fn try_lock(&self) -> Result<bool, LockError> {
        let mut held = self.held.lock().map_err(poisoned)?;
        let acquired = !*held;
        *held = true;
        Ok(acquired)
    }

    fn unlock(&self) -> Result<(), LockError> {
        let mut held = self.held.lock().map_err(poisoned)?;
        if std::mem::replace(&mut *held, false) {
            self.released.notify_one();
        }
        Ok(())
    }
}

const INITIAL_PRUNE_AT: usize = 1024;

struct Registry {
    locks: HashMap<String, Arc<InMemoryLock>>,
    prune_at: usize,
}

/// One [`InMemoryLock`] per user key, created on first use.
///
/// Every learner gets an entry, so the map is pruned once it doubles in size:
/// a lock whose `Arc` is referenced only by the map has no holder and no
/// waiter and can be dropped.
pub struct InMemoryLockManager {
    registry: Mutex<Registry>,
}

impl InMemoryLockManager {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                locks: HashMap::new(),
                prune_at: INITIAL_PRUNE_AT,
            }),
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> Result<usize, LockError> {
        let registry = self
            .registry
            .lock()
            .map_err(|_| LockError::Poisoned("user lock registry".into()))?;
        Ok(registry.locks.len())
    }

    fn prune(registry: &mut Registry) {
        let before = registry.locks.len();
        registry.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        registry.prune_at = (registry.locks.len() * 2).max(INITIAL_PRUNE_AT);
        tracing::debug!(before, after = registry.locks.len(), "pruned idle user locks");
    }
}

impl Default for InMemoryLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager for InMemoryLockManager {
    type Lock = InMemoryLock;

    fn get_lock(&self, key: &str) -> Result<Arc<InMemoryLock>, LockError> {
        let mut registry = self
            .registry
            .lock()
            .map_err(|_| LockError::Poisoned("user lock registry".into()))?;
        if registry.locks.len() >= registry.prune_at {
            Self::prune(&mut registry);
        }
        let lock = registry.locks.entry(key.to_string()).or_default();
        Ok(Arc::clone(lock))
    }
}
