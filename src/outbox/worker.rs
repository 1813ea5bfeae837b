use std::time::Duration;

use super::{Notification, OutboxPublisher, OutboxStore};
use crate::config::OutboxConfig;
use crate::store::StoreError;

/// Result of one drain pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainResult {
    pub claimed: usize,
    pub completed: usize,
    pub released: usize,
    pub failed: usize,
}

/// Claims pending outbox records and hands them to a publisher.
///
/// A record whose publish fails goes back to `Pending` until it has been
/// attempted `max_attempts` times, after which it is parked as `Failed`.
/// Undecodable payloads fail immediately.
pub struct OutboxWorker<P> {
    publisher: P,
    worker_id: String,
    batch_size: usize,
    lease: Duration,
    max_attempts: u32,
}

impl<P> OutboxWorker<P> {
    pub fn new(publisher: P) -> Self {
        Self {
            publisher,
            worker_id: format!("worker-{}", std::process::id()),
            batch_size: 10,
            lease: Duration::from_secs(60),
            max_attempts: 3,
        }
    }

    pub fn from_config(publisher: P, config: &OutboxConfig) -> Self {
        Self::new(publisher)
            .with_worker_id(config.worker_id.clone())
            .with_batch_size(config.batch_size)
            .with_lease(Duration::from_secs(config.lease_secs))
            .with_max_attempts(config.max_attempts)
    }

    pub fn with_worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker_id = id.into();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }
}

impl<P: OutboxPublisher> OutboxWorker<P> {
    /// Claim one batch and try to deliver it.
    pub fn drain_once<S: OutboxStore + ?Sized>(&mut self, store: &S) -> Result<DrainResult, StoreError> {
        let claimed = store.claim_outbox(&self.worker_id, self.batch_size, self.lease)?;
        let mut result = DrainResult {
            claimed: claimed.len(),
            ..Default::default()
        };

        for record in claimed {
            let outcome = Notification::decode(&record)
                .map_err(|e| (format!("undecodable payload: {}", e), true))
                .and_then(|notification| {
                    self.publisher
                        .publish(&notification)
                        .map_err(|e| (e.to_string(), false))
                });

            match outcome {
                Ok(()) => {
                    store.complete_outbox(&[record.id])?;
                    result.completed += 1;
                }
                Err((error, fatal)) if fatal || record.attempts >= self.max_attempts => {
                    tracing::warn!(
                        outbox_id = record.id,
                        key = %record.key,
                        attempts = record.attempts,
                        %error,
                        "notification permanently failed"
                    );
                    store.fail_outbox(&[record.id], Some(&error))?;
                    result.failed += 1;
                }
                Err((error, _)) => {
                    tracing::warn!(
                        outbox_id = record.id,
                        key = %record.key,
                        attempts = record.attempts,
                        %error,
                        "notification delivery failed, will retry"
                    );
                    store.release_outbox(&[record.id], Some(&error))?;
                    result.released += 1;
                }
            }
        }

        Ok(result)
    }

    /// Drain until a pass claims nothing or only produced retries.
    pub fn drain<S: OutboxStore + ?Sized>(&mut self, store: &S) -> Result<DrainResult, StoreError> {
        let mut total = DrainResult::default();
        loop {
            let pass = self.drain_once(store)?;
            total.claimed += pass.claimed;
            total.completed += pass.completed;
            total.released += pass.released;
            total.failed += pass.failed;
            if pass.claimed == 0 || pass.released > 0 {
                return Ok(total);
            }
        }
    }
}
