use formation_progress::ProgressError;

use crate::support::{chain_catalog, engine};

#[test]
fn first_content_is_open_for_a_new_user() {
    let engine = engine(chain_catalog());
    assert!(engine.is_content_unlocked("nobody", "x1").unwrap());
    assert!(!engine.is_content_unlocked("nobody", "x2").unwrap());
    assert!(!engine.is_content_unlocked("nobody", "y1").unwrap());
    assert!(engine.is_module_unlocked("nobody", "m1").unwrap());
    assert!(!engine.is_module_unlocked("nobody", "m2").unwrap());
}

#[test]
fn completing_a_content_opens_only_its_successor() {
    let engine = engine(chain_catalog());
    engine.record_watch_time("u1", "x1", 100.0).unwrap();

    assert!(engine.is_content_unlocked("u1", "x2").unwrap());
    assert!(!engine.is_content_unlocked("u1", "x3").unwrap());
    // other users are unaffected
    assert!(!engine.is_content_unlocked("u2", "x2").unwrap());
}

#[test]
fn chain_continues_into_the_next_module() {
    let engine = engine(chain_catalog());
    for id in ["x1", "x2", "x3"] {
        engine.record_watch_time("u1", id, 100.0).unwrap();
    }
    assert!(engine.is_content_unlocked("u1", "y1").unwrap());
    assert!(engine.is_module_unlocked("u1", "m2").unwrap());
}

#[test]
fn locked_content_rejects_watch_time() {
    let engine = engine(chain_catalog());
    let err = engine.record_watch_time("u1", "x2", 10.0).unwrap_err();
    assert_eq!(
        err,
        ProgressError::Locked {
            content_id: "x2".into()
        }
    );
    assert_eq!(err.status_code(), 403);
    assert!(engine.content_progress("u1", "x2").unwrap().is_none());
}

#[test]
fn deactivated_content_leaves_the_chain() {
    let mut catalog = chain_catalog();
    catalog.set_content_active("x2", false).unwrap();
    let engine = engine(catalog);

    engine.record_watch_time("u1", "x1", 100.0).unwrap();
    assert!(engine.is_content_unlocked("u1", "x3").unwrap());
    assert!(matches!(
        engine.is_content_unlocked("u1", "x2"),
        Err(ProgressError::NotFound { .. })
    ));
}
