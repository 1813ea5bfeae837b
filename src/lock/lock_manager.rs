use std::sync::Arc;

use super::{Lock, LockError, LockGuard};

/// Hands out one lock per key (the engine keys by user id).
pub trait LockManager: Send + Sync {
    /// The concrete lock type returned by this manager.
    type Lock: Lock;

    /// Get (or create) the lock for the given key.
    ///
    /// Repeated calls with the same key must return the same logical lock.
    fn get_lock(&self, key: &str) -> Result<Arc<Self::Lock>, LockError>;

    /// Block until the lock for `key` is held and return a guard releasing it on drop.
    fn acquire(&self, key: &str) -> Result<LockGuard<Self::Lock>, LockError> {
        let lock = self.get_lock(key)?;
        lock.lock()?;
        Ok(LockGuard::new(key, lock))
    }
}
