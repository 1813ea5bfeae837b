use std::time::Duration;

use formation_progress::config::CacheConfig;
use formation_progress::{CachedProgressStore, InMemoryProgressStore, ProgressEngine};

use crate::support::chain_catalog;

#[test]
fn completion_is_visible_through_the_cache_immediately() {
    let store = CachedProgressStore::new(InMemoryProgressStore::new(), Duration::from_secs(300));
    let engine = ProgressEngine::new(store, chain_catalog());

    assert!(!engine.is_content_unlocked("u1", "x2").unwrap());
    assert!(!engine.is_content_unlocked("u1", "x2").unwrap());
    assert!(engine.store().stats().hits >= 1);

    engine.record_watch_time("u1", "x1", 100.0).unwrap();
    assert!(engine.is_content_unlocked("u1", "x2").unwrap());
}

#[test]
fn disabled_cache_passes_through() {
    let config = CacheConfig {
        enabled: false,
        ttl_secs: 300,
    };
    let store = CachedProgressStore::from_config(InMemoryProgressStore::new(), &config);
    let engine = ProgressEngine::new(store, chain_catalog());

    engine.is_content_unlocked("u1", "x2").unwrap();
    engine.is_content_unlocked("u1", "x2").unwrap();
    assert_eq!(engine.store().stats().hits, 0);
}
