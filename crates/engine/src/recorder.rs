//! State recorder, the only writer of the delivered flag.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use mailbatch_common::error::StoreError;
use mailbatch_common::types::RecipientId;

use crate::store::RecipientStore;

#[derive(Debug, Error)]
pub enum RecordFailure {
    #[error("mark delivered timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RecordFailure {
    /// Short reason code used in logs and on the delivery attempt.
    pub fn reason(&self) -> &'static str {
        match self {
            RecordFailure::Timeout(_) => "record_timeout",
            RecordFailure::Store(StoreError::Conflict(_)) => "record_conflict",
            RecordFailure::Store(StoreError::Unavailable(_)) => "store_unavailable",
            RecordFailure::Store(_) => "record_error",
        }
    }
}

/// Commits a single recipient's delivered transition under its own timeout.
///
/// Failures are reported, never retried here; a recipient left pending is
/// simply picked up again by a later batch.
#[derive(Clone)]
pub struct StateRecorder {
    store: Arc<dyn RecipientStore>,
    timeout: Duration,
}

impl StateRecorder {
    pub fn new(store: Arc<dyn RecipientStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn mark_delivered(&self, id: RecipientId) -> Result<(), RecordFailure> {
        tokio::time::timeout(self.timeout, self.store.mark_delivered(id))
            .await
            .map_err(|_| RecordFailure::Timeout(self.timeout))??;

        tracing::trace!(recipient_id = id, "Recipient marked delivered");
        Ok(())
    }
}
