use formation_progress::{
    Chapter, ConfigError, Content, EngineConfig, InMemoryCatalog, Module, ProgressError, ProgressState,
};

use crate::support::{chain_catalog, engine};

#[test]
fn threshold_is_inclusive_at_95_percent() {
    let engine = engine(chain_catalog());

    let outcome = engine.record_watch_time("u1", "x1", 94.0).unwrap();
    assert!(!outcome.progress.is_completed);
    assert_eq!(outcome.progress_percent, 94);

    let outcome = engine.record_watch_time("u1", "x1", 95.0).unwrap();
    assert!(outcome.progress.is_completed);
    assert!(outcome.progress.completed_at.is_some());
}

#[test]
fn watch_time_is_clamped_to_duration() {
    let engine = engine(chain_catalog());
    let outcome = engine.record_watch_time("u1", "x1", 600.0).unwrap();
    assert_eq!(outcome.progress.watch_time, 100.0);
    assert_eq!(outcome.progress_percent, 100);

    let stored = engine.content_progress("u1", "x1").unwrap().unwrap();
    assert_eq!(stored.watch_time, 100.0);
}

#[test]
fn completion_never_reverts() {
    let engine = engine(chain_catalog());
    engine.record_watch_time("u1", "x1", 100.0).unwrap();
    let first = engine.content_progress("u1", "x1").unwrap().unwrap();

    for seconds in [0.0, 12.5, 94.0] {
        let outcome = engine.record_watch_time("u1", "x1", seconds).unwrap();
        assert!(outcome.progress.is_completed);
        assert_eq!(outcome.progress.watch_time, seconds);
        assert_eq!(outcome.progress.completed_at, first.completed_at);
        assert_eq!(outcome.progress.state(), ProgressState::Completed);
    }
}

#[test]
fn invalid_watch_time_is_rejected() {
    let engine = engine(chain_catalog());
    for bad in [-0.5, f64::NAN, f64::NEG_INFINITY] {
        let err = engine.record_watch_time("u1", "x1", bad).unwrap_err();
        assert!(matches!(err, ProgressError::InvalidInput(_)));
        assert_eq!(err.status_code(), 400);
    }
    assert!(engine.content_progress("u1", "x1").unwrap().is_none());
}

#[test]
fn unknown_content_is_not_found() {
    let engine = engine(chain_catalog());
    let err = engine.record_watch_time("u1", "ghost", 10.0).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn chapter_and_module_cascade_without_quiz() {
    let engine = engine(chain_catalog());
    engine.record_watch_time("u1", "x1", 100.0).unwrap();
    engine.record_watch_time("u1", "x2", 100.0).unwrap();
    assert!(engine.chapter_progress("u1", "m1-ch").unwrap().is_none());

    engine.record_watch_time("u1", "x3", 100.0).unwrap();
    assert!(engine.chapter_progress("u1", "m1-ch").unwrap().unwrap().is_completed);
    assert!(engine.module_progress("u1", "m1").unwrap().unwrap().is_completed);
}

#[test]
fn configured_threshold_applies_everywhere() {
    let config = EngineConfig::from_toml_str("[completion]\nthreshold = 0.5").unwrap();
    let engine = formation_progress::ProgressEngine::with_config(
        formation_progress::InMemoryProgressStore::new(),
        chain_catalog(),
        config,
    )
    .unwrap();
    assert!(engine.record_watch_time("u1", "x1", 50.0).unwrap().progress.is_completed);
    assert!(engine.is_content_unlocked("u1", "x2").unwrap());
}

#[test]
fn engine_refuses_an_invalid_config() {
    for threshold in [0.0, f64::NAN, 1.5] {
        let mut config = EngineConfig::default();
        config.completion.threshold = threshold;
        let built = formation_progress::ProgressEngine::with_config(
            formation_progress::InMemoryProgressStore::new(),
            chain_catalog(),
            config,
        );
        assert!(matches!(built, Err(ConfigError::Invalid(_))));
    }
}

#[test]
fn record_lookups_reject_unknown_ids() {
    let engine = engine(chain_catalog());
    for err in [
        engine.content_progress("u1", "ghost").unwrap_err(),
        engine.chapter_progress("u1", "ghost").unwrap_err(),
        engine.module_progress("u1", "ghost").unwrap_err(),
        engine.quiz_result("u1", "ghost").unwrap_err(),
    ] {
        assert_eq!(err.status_code(), 404);
    }
    assert!(engine.chapter_progress("u1", "m1-ch").unwrap().is_none());
}

#[test]
fn retired_chapter_leaves_the_next_module_reachable() {
    let mut catalog = InMemoryCatalog::new();
    catalog.insert_module(Module::new("m1", 1)).unwrap();
    catalog.insert_module(Module::new("m2", 2)).unwrap();
    catalog.insert_chapter(Chapter::new("c1", "m1", 1)).unwrap();
    catalog.insert_chapter(Chapter::new("c2", "m1", 2)).unwrap();
    catalog.insert_chapter(Chapter::new("d1", "m2", 1)).unwrap();
    catalog.insert_content(Content::new("a", "c1", 1, 100)).unwrap();
    catalog.insert_content(Content::new("b", "c2", 1, 100).inactive()).unwrap();
    catalog.insert_content(Content::new("z", "d1", 1, 100)).unwrap();
    let engine = engine(catalog);

    assert!(!engine.is_module_unlocked("u1", "m2").unwrap());
    engine.record_watch_time("u1", "a", 100.0).unwrap();

    assert!(engine.chapter_progress("u1", "c2").unwrap().unwrap().is_completed);
    assert!(engine.module_progress("u1", "m1").unwrap().unwrap().is_completed);
    assert!(engine.is_module_unlocked("u1", "m2").unwrap());
}
