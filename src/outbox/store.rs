use std::time::Duration;

use super::OutboxRecord;
use crate::store::StoreError;

/// Claim/lease bookkeeping over persisted outbox records.
///
/// Messages enter the outbox only through [`crate::store::ProgressStore::commit`].
pub trait OutboxStore: Send + Sync {
    fn peek_outbox(&self) -> Result<Vec<OutboxRecord>, StoreError>;

    /// Lease up to `max` claimable records to `worker_id` for `lease`.
    fn claim_outbox(
        &self,
        worker_id: &str,
        max: usize,
        lease: Duration,
    ) -> Result<Vec<OutboxRecord>, StoreError>;

    fn complete_outbox(&self, ids: &[u64]) -> Result<(), StoreError>;

    /// Return records to `Pending` for another attempt.
    fn release_outbox(&self, ids: &[u64], error: Option<&str>) -> Result<(), StoreError>;

    /// Park records as permanently `Failed`.
    fn fail_outbox(&self, ids: &[u64], error: Option<&str>) -> Result<(), StoreError>;
}
