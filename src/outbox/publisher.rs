use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::Notification;

/// A failed delivery attempt; the worker records the message on the outbox row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("publish failed: {0}")]
pub struct PublishError(pub String);

impl PublishError {
    pub fn new(message: impl Into<String>) -> Self {
        PublishError(message.into())
    }
}

/// Delivers notifications to the notification/email layer.
pub trait OutboxPublisher: Send {
    fn publish(&mut self, notification: &Notification) -> Result<(), PublishError>;
}

impl<P: OutboxPublisher + ?Sized> OutboxPublisher for Box<P> {
    fn publish(&mut self, notification: &Notification) -> Result<(), PublishError> {
        (**self).publish(notification)
    }
}

/// Publisher that logs each notification, or appends it to a shared buffer.
#[derive(Default)]
pub struct LogPublisher {
    buffer: Option<Arc<Mutex<Vec<String>>>>,
}

impl LogPublisher {
    pub fn new() -> Self {
        LogPublisher { buffer: None }
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<String>>>) -> Self {
        LogPublisher {
            buffer: Some(buffer),
        }
    }
}

impl OutboxPublisher for LogPublisher {
    fn publish(&mut self, notification: &Notification) -> Result<(), PublishError> {
        let payload =
            serde_json::to_string(notification).map_err(|e| PublishError::new(e.to_string()))?;
        let line = format!("[OUTBOX] {} {}", notification.event_type(), payload);
        match &self.buffer {
            Some(buffer) => {
                let mut buffer = buffer
                    .lock()
                    .map_err(|_| PublishError::new("log publisher buffer poisoned"))?;
                buffer.push(line);
            }
            None => tracing::info!(event_type = notification.event_type(), %payload, "outbox notification"),
        }
        Ok(())
    }
}

/// Publisher that re-emits notifications as JSON strings on an in-process
/// `EventEmitter`, keyed by event type.
#[cfg(feature = "emitter")]
pub struct LocalEmitterPublisher {
    emitter: event_emitter_rs::EventEmitter,
}

#[cfg(feature = "emitter")]
impl LocalEmitterPublisher {
    pub fn new(emitter: event_emitter_rs::EventEmitter) -> Self {
        LocalEmitterPublisher { emitter }
    }

    pub fn emitter_mut(&mut self) -> &mut event_emitter_rs::EventEmitter {
        &mut self.emitter
    }
}

#[cfg(feature = "emitter")]
impl OutboxPublisher for LocalEmitterPublisher {
    fn publish(&mut self, notification: &Notification) -> Result<(), PublishError> {
        let payload =
            serde_json::to_string(notification).map_err(|e| PublishError::new(e.to_string()))?;
        self.emitter.emit(notification.event_type(), payload);
        Ok(())
    }
}
