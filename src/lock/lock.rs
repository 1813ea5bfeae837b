use super::LockError;

/// Mutual exclusion for one user's mutations.
///
/// The bundled implementation is process-local. Several engine processes
/// sharing one database need a shared primitive instead (a Postgres
/// advisory lock on the user id, or a lease row).
pub trait Lock: Send + Sync {
    /// Block until held.
    fn lock(&self) -> Result<(), LockError>;

    /// `Ok(false)` when someone else holds the lock.
    fn try_lock(&self) -> Result<bool, LockError>;

    fn unlock(&self) -> Result<(), LockError>;
}
