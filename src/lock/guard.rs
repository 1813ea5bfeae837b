use std::sync::Arc;

use super::Lock;

/// Releases a held [`Lock`] when dropped, including on early `?` returns.
pub struct LockGuard<L: Lock> {
    key: String,
    lock: Arc<L>,
}

impl<L: Lock> LockGuard<L> {
    pub(crate) fn new(key: &str, lock: Arc<L>) -> Self {
        Self {
            key: key.to_string(),
            lock,
        }
    }

    /// The key this guard holds.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<L: Lock> Drop for LockGuard<L> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.unlock() {
            tracing::warn!(key = %self.key, error = %err, "failed to release lock");
        }
    }
}
