//! Notification outbox.
//!
//! A module's first completion stages a [`Notification::ModuleCompleted`]
//! message in the same unit of work as the `ModuleProgress` write, so the
//! event exists if and only if the transition was committed. Delivery happens
//! afterwards through an [`OutboxWorker`] and an [`OutboxPublisher`]; a
//! delivery failure is retried or marked failed in the outbox and never rolls
//! back progress.

mod message;
mod notification;
mod publisher;
mod store;
mod worker;

pub use message::{OutboxMessage, OutboxRecord, OutboxStatus};
pub use notification::{ModuleCompleted, Notification};
#[cfg(feature = "emitter")]
pub use publisher::LocalEmitterPublisher;
pub use publisher::{LogPublisher, OutboxPublisher, PublishError};
pub use store::OutboxStore;
pub use worker::{DrainResult, OutboxWorker};
