//! Per-user locks that serialise mutating engine calls.
//!
//! Every mutating entry point of the engine takes the lock keyed by the
//! user id before opening its unit of work. Two rapid watch-time pings, or a
//! content completion racing a quiz pass, therefore run one after the other
//! for the same user while different users never contend.

mod error;
mod guard;
mod in_memory;
mod lock;
mod lock_manager;

pub use error::LockError;
pub use guard::LockGuard;
pub use in_memory::{InMemoryLock, InMemoryLockManager};
pub use lock::Lock;
pub use lock_manager::LockManager;
