//! CachedProgressStore - short-lived read cache in front of a progress store.
//!
//! Unlock queries read the same handful of rows over and over, so point
//! lookups may be served from memory. A stale row is a wrong unlock
//! decision, so every commit invalidates the touched users before it
//! returns, and a generation check keeps a load that raced with that
//! invalidation from re-populating the cache with the old row.
//!
//! Generations come from one clock shared by all users. Users whose entries
//! have all expired are pruned once the map doubles in size; a prune also
//! ticks the clock, so a load that started before it can no longer fill.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{Changeset, ProgressStore, RecordKey, StoreError, StoredRecord};
use crate::config::CacheConfig;
use crate::outbox::{OutboxRecord, OutboxStore};

const INITIAL_PRUNE_AT: usize = 1024;

struct CacheEntry {
    loaded_at: Instant,
    value: Option<StoredRecord>,
}

struct UserCache {
    generation: u64,
    entries: HashMap<RecordKey, CacheEntry>,
}

impl UserCache {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            entries: HashMap::new(),
        }
    }
}

struct Registry {
    users: HashMap<String, UserCache>,
    clock: u64,
    last_prune: u64,
    prune_at: usize,
}

impl Registry {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn prune(&mut self, ttl: Duration) {
        let before = self.users.len();
        for user in self.users.values_mut() {
            user.entries.retain(|_, entry| entry.loaded_at.elapsed() < ttl);
        }
        self.users.retain(|_, user| !user.entries.is_empty());
        self.last_prune = self.tick();
        self.prune_at = (self.users.len() * 2).max(INITIAL_PRUNE_AT);
        tracing::debug!(before, after = self.users.len(), "pruned expired cache users");
    }
}

/// Hit/miss counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Read-through cache over point lookups. Scans always bypass it.
pub struct CachedProgressStore<S> {
    inner: S,
    enabled: bool,
    ttl: Duration,
    registry: Mutex<Registry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S> CachedProgressStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            enabled: !ttl.is_zero(),
            ttl,
            registry: Mutex::new(Registry {
                users: HashMap::new(),
                clock: 0,
                last_prune: 0,
                prune_at: INITIAL_PRUNE_AT,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(inner: S, config: &CacheConfig) -> Self {
        let ttl = if config.enabled {
            Duration::from_secs(config.ttl_secs)
        } else {
            Duration::ZERO
        };
        Self::new(inner, ttl)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of users currently holding a cache slot.
    pub fn tracked_users(&self) -> Result<usize, StoreError> {
        Ok(self.registry("cache stats")?.users.len())
    }

    /// Drop every cached row of `user_id`.
    pub fn invalidate_user(&self, user_id: &str) -> Result<(), StoreError> {
        let mut registry = self.registry("cache invalidate")?;
        let generation = registry.tick();
        let user = registry
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserCache::new(generation));
        user.generation = generation;
        user.entries.clear();
        Ok(())
    }

    fn registry(&self, context: &'static str) -> Result<MutexGuard<'_, Registry>, StoreError> {
        self.registry
            .lock()
            .map_err(|_| StoreError::LockPoisoned(context))
    }

    /// Returns the fresh cached value, if any, and the generation a fill
    /// for this key must still see.
    fn lookup(&self, key: &RecordKey) -> Result<(Option<Option<StoredRecord>>, u64), StoreError> {
        let mut registry = self.registry("cache read")?;
        if registry.users.len() >= registry.prune_at {
            registry.prune(self.ttl);
        }
        let clock = registry.clock;
        let Some(user) = registry.users.get_mut(&key.user_id) else {
            return Ok((None, clock));
        };
        let fresh = match user.entries.get(key) {
            Some(entry) if entry.loaded_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                user.entries.remove(key);
                None
            }
            None => None,
        };
        Ok((fresh, user.generation))
    }

    fn remember(
        &self,
        key: &RecordKey,
        generation: u64,
        value: Option<StoredRecord>,
    ) -> Result<(), StoreError> {
        let mut registry = self.registry("cache write")?;
        let admit = match registry.users.get(&key.user_id) {
            Some(user) => user.generation == generation,
            None => generation >= registry.last_prune,
        };
        if !admit {
            return Ok(());
        }
        let clock = registry.clock;
        let user = registry
            .users
            .entry(key.user_id.clone())
            .or_insert_with(|| UserCache::new(clock));
        user.entries.insert(
            key.clone(),
            CacheEntry {
                loaded_at: Instant::now(),
                value,
            },
        );
        Ok(())
    }
}

impl<S: ProgressStore> ProgressStore for CachedProgressStore<S> {
    fn load(&self, key: &RecordKey) -> Result<Option<StoredRecord>, StoreError> {
        if !self.enabled {
            return self.inner.load(key);
        }

        let (cached, generation) = self.lookup(key)?;
        if let Some(value) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = self.inner.load(key)?;
        self.remember(key, generation, value.clone())?;
        Ok(value)
    }

    fn scan(
        &self,
        collection: &str,
        user_id: &str,
    ) -> Result<Vec<(RecordKey, StoredRecord)>, StoreError> {
        self.inner.scan(collection, user_id)
    }

    fn commit(&self, changeset: Changeset) -> Result<(), StoreError> {
        let users = changeset.users();
        let result = self.inner.commit(changeset);
        if self.enabled {
            for user in &users {
                self.invalidate_user(user)?;
            }
        }
        result
    }
}

impl<S: OutboxStore> OutboxStore for CachedProgressStore<S> {
    fn peek_outbox(&self) -> Result<Vec<OutboxRecord>, StoreError> {
        self.inner.peek_outbox()
    }

    fn claim_outbox(
        &self,
        worker_id: &str,
        max: usize,
        lease: Duration,
    ) -> Result<Vec<OutboxRecord>, StoreError> {
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
