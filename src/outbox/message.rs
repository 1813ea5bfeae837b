use std::time::SystemTime;

use serde::Serialize;

/// Delivery status of an outbox record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutboxStatus {
    #[default]
    Pending,
    InFlight,
    Published,
    Failed,
}

/// A message staged in a unit of work, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxMessage {
    /// Dedupe key: a second message with the same key is dropped at commit.
    pub key: String,
    pub event_type: String,
    /// bitcode-encoded payload.
    pub payload: Vec<u8>,
}

impl OutboxMessage {
    pub fn create(key: impl Into<String>, event_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            event_type: event_type.into(),
            payload,
        }
    }

    /// Create a message with a bitcode-serialized payload.
    pub fn encode<T: Serialize>(
        key: impl Into<String>,
        event_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, bitcode::Error> {
        let bytes = bitcode::serialize(payload)?;
        Ok(Self::create(key, event_type, bytes))
    }
}

/// A persisted outbox entry with its delivery bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRecord {
    pub id: u64,
    pub key: String,
    pub event_type: String,
    pub payload: Vec<u8>,
    pub occurred_at: SystemTime,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub locked_by: Option<String>,
    pub locked_until: Option<SystemTime>,
    pub published_at: Option<SystemTime>,
    pub failed_at: Option<SystemTime>,
    pub last_error: Option<String>,
}

impl OutboxRecord {
    pub fn pending(id: u64, message: OutboxMessage) -> Self {
        Self {
            id,
            key: message.key,
            event_type: message.event_type,
            payload: message.payload,
            occurred_at: SystemTime::now(),
            status: OutboxStatus::Pending,
            attempts: 0,
            locked_by: None,
            locked_until: None,
            published_at: None,
            failed_at: None,
            last_error: None,
        }
    }

    /// Whether a worker may claim this record at `now`.
    pub fn claimable(&self, now: SystemTime) -> bool {
        match self.status {
            OutboxStatus::Pending => true,
            OutboxStatus::InFlight => self.locked_until.map(|until| until <= now).unwrap_or(true),
            OutboxStatus::Published | OutboxStatus::Failed => false,
        }
    }
}
