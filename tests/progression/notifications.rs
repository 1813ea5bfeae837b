use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use formation_progress::{
    LogPublisher, Notification, OutboxPublisher, OutboxStatus, OutboxStore, PublishError,
};

use crate::support::{chain_catalog, engine};

struct DownPublisher;

impl OutboxPublisher for DownPublisher {
    fn publish(&mut self, _notification: &Notification) -> Result<(), PublishError> {
        Err(PublishError::new("mail relay unreachable"))
    }
}

/// Panics on its first delivery, then records payloads.
struct CrashOncePublisher {
    crashed: bool,
    delivered: Arc<Mutex<Vec<String>>>,
}

impl OutboxPublisher for CrashOncePublisher {
    fn publish(&mut self, notification: &Notification) -> Result<(), PublishError> {
        if !self.crashed {
            self.crashed = true;
            panic!("publisher crashed");
        }
        let payload = serde_json::to_string(notification).map_err(|e| PublishError::new(e.to_string()))?;
        self.delivered.lock().unwrap().push(payload);
        Ok(())
    }
}

fn complete_module(engine: &crate::support::Engine) {
    complete_module_for(engine, "u1");
}

fn complete_module_for(engine: &crate::support::Engine, user_id: &str) {
    for id in ["x1", "x2", "x3"] {
        engine.record_watch_time(user_id, id, 100.0).unwrap();
    }
}

#[test]
fn attached_publisher_receives_module_completion() {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let engine = engine(chain_catalog()).with_notifications(LogPublisher::with_buffer(buffer.clone()));

    complete_module(&engine);

    let lines = buffer.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[OUTBOX] ModuleCompleted"));
    assert!(lines[0].contains("\"m1\""));

    let outbox = engine.store().peek_outbox().unwrap();
    assert_eq!(outbox[0].status, OutboxStatus::Published);
}

#[test]
fn without_publisher_events_stay_pending() {
    let engine = engine(chain_catalog());
    complete_module(&engine);

    let outbox = engine.store().peek_outbox().unwrap();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].status, OutboxStatus::Pending);
    assert!(engine.dispatch_notifications().is_none());
}

#[test]
fn delivery_failure_never_fails_the_engine_call() {
    let engine = engine(chain_catalog()).with_notifications(DownPublisher);

    complete_module(&engine);
    assert!(engine.module_progress("u1", "m1").unwrap().unwrap().is_completed);

    let outbox = engine.store().peek_outbox().unwrap();
    assert_eq!(outbox[0].status, OutboxStatus::Pending);
    assert_eq!(outbox[0].attempts, 1);
    assert!(outbox[0].last_error.as_deref().unwrap().contains("mail relay"));

    // retries exhaust max_attempts (3) and park the record
    engine.dispatch_notifications().unwrap();
    engine.dispatch_notifications().unwrap();
    let outbox = engine.store().peek_outbox().unwrap();
    assert_eq!(outbox[0].status, OutboxStatus::Failed);
    assert_eq!(outbox[0].attempts, 3);
}

#[test]
fn publisher_panic_does_not_stop_later_deliveries() {
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let engine = engine(chain_catalog()).with_notifications(CrashOncePublisher {
        crashed: false,
        delivered: delivered.clone(),
    });

    let crashed = panic::catch_unwind(AssertUnwindSafe(|| complete_module_for(&engine, "u1")));
    assert!(crashed.is_err());
    assert!(engine.module_progress("u1", "m1").unwrap().unwrap().is_completed);

    complete_module_for(&engine, "u2");
    let delivered = delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].contains("u2"));
}

#[cfg(feature = "emitter")]
#[test]
fn emitter_publisher_fans_out_in_process() {
    use formation_progress::{EventEmitter, LocalEmitterPublisher};
    use std::sync::mpsc;
    use std::time::Duration;

    let (tx, rx) = mpsc::channel::<String>();
    let tx = Mutex::new(tx);
    let mut emitter = EventEmitter::new();
    emitter.on(Notification::MODULE_COMPLETED, move |payload: String| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(payload);
        }
    });

    let engine = engine(chain_catalog()).with_notifications(LocalEmitterPublisher::new(emitter));
    complete_module(&engine);

    let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(payload.contains("u1"));
}
