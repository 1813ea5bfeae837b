use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OutboxMessage, OutboxRecord};

/// Payload of the one-time event fired when a user completes a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCompleted {
    pub user_id: String,
    pub module_id: String,
    /// RFC 3339 timestamp.
    pub completed_at: String,
}

/// Events the engine hands to the notification layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    ModuleCompleted(ModuleCompleted),
}

impl Notification {
    pub const MODULE_COMPLETED: &'static str = "ModuleCompleted";

    pub fn module_completed(user_id: &str, module_id: &str, completed_at: DateTime<Utc>) -> Self {
        Notification::ModuleCompleted(ModuleCompleted {
            user_id: user_id.to_string(),
            module_id: module_id.to_string(),
            completed_at: completed_at.to_rfc3339(),
        })
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Notification::ModuleCompleted(_) => Self::MODULE_COMPLETED,
        }
    }

    /// Dedupe key; at most one message per key ever reaches the outbox.
    pub fn dedupe_key(&self) -> String {
        match self {
            Notification::ModuleCompleted(event) => {
                format!("module-completed:{}:{}", event.user_id, event.module_id)
            }
        }
    }

    pub fn to_message(&self) -> Result<OutboxMessage, bitcode::Error> {
        OutboxMessage::encode(self.dedupe_key(), self.event_type(), self)
    }

    pub fn decode(record: &OutboxRecord) -> Result<Self, bitcode::Error> {
        bitcode::deserialize(&record.payload)
    }
}
