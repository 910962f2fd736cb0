//! Recipient selector: picks the pending recipients for one batch.

use std::sync::Arc;
use std::time::Duration;

use mailbatch_common::error::DispatchError;
use mailbatch_common::types::Recipient;

use crate::store::RecipientStore;

/// Read-only view of the store used at the start of every batch.
#[derive(Clone)]
pub struct RecipientSelector {
    store: Arc<dyn RecipientStore>,
    timeout: Duration,
}

impl RecipientSelector {
    pub fn new(store: Arc<dyn RecipientStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Select up to `limit` recipients that have not been delivered yet.
    ///
    /// Failures are fatal to the batch: an unreachable store (or one that does
    /// not answer within the select timeout) is `StorageUnavailable`, any other
    /// read failure is `StorageQuery`. No partial selection is returned.
    pub async fn select(&self, limit: i64) -> Result<Vec<Recipient>, DispatchError> {
        let recipients = tokio::time::timeout(self.timeout, self.store.select_pending(limit))
            .await
            .map_err(|_| {
                DispatchError::StorageUnavailable(format!(
                    "selection timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })??;

        tracing::debug!(limit, selected = recipients.len(), "Selected pending recipients");
        Ok(recipients)
    }
}
