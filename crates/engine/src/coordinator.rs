//! Dispatch coordinator: runs one batch from selection to summary.
//!
//! Recipients are fanned out over a bounded pool of delivery workers. The
//! pool never holds more than `max_concurrency` workers in flight and is
//! refilled as workers finish; outcome semantics are the same for any
//! degree >= 1. `dispatch` returns only after every spawned worker has
//! terminated.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use mailbatch_common::error::DispatchError;
use mailbatch_common::types::{BatchResult, MessageTemplate, Recipient};
use mailbatch_notifier::{AttachmentSource, Transport};

use crate::aggregator::ResultAggregator;
use crate::recorder::StateRecorder;
use crate::selector::RecipientSelector;
use crate::store::RecipientStore;
use crate::worker::DeliveryWorker;

/// Default number of delivery workers in flight.
const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Default timeout for selecting a batch.
const DEFAULT_SELECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a single "mark delivered" write.
const DEFAULT_RECORD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    /// Upper bound on concurrently running workers; values below 1 are treated as 1.
    pub max_concurrency: usize,
    pub select_timeout: Duration,
    pub record_timeout: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            select_timeout: DEFAULT_SELECT_TIMEOUT,
            record_timeout: DEFAULT_RECORD_TIMEOUT,
        }
    }
}

/// Batch dispatch-and-record engine.
pub struct Dispatcher {
    selector: RecipientSelector,
    worker: Arc<DeliveryWorker>,
    max_concurrency: usize,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn RecipientStore>,
        transport: Arc<dyn Transport>,
        attachments: Arc<dyn AttachmentSource>,
        settings: DispatchSettings,
    ) -> Self {
        let selector = RecipientSelector::new(store.clone(), settings.select_timeout);
        let recorder = StateRecorder::new(store, settings.record_timeout);

        Self {
            selector,
            worker: Arc::new(DeliveryWorker::new(transport, attachments, recorder)),
            max_concurrency: settings.max_concurrency.max(1),
        }
    }

    /// Select up to `limit` pending recipients and deliver `message` to each.
    ///
    /// A selection failure aborts the batch before any worker is spawned.
    /// Per-recipient failures never do; they are only visible in the log.
    #[tracing::instrument(skip_all, fields(batch_id = %Uuid::new_v4(), limit = limit))]
    pub async fn run_batch(
        &self,
        limit: i64,
        message: Arc<MessageTemplate>,
    ) -> Result<BatchResult, DispatchError> {
        let recipients = self.selector.select(limit).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to select pending recipients");
            e
        })?;

        Ok(self.dispatch(recipients, message).await)
    }

    /// Deliver `message` to every recipient and wait for all workers.
    pub async fn dispatch(
        &self,
        recipients: Vec<Recipient>,
        message: Arc<MessageTemplate>,
    ) -> BatchResult {
        let selected = recipients.len();
        if selected == 0 {
            tracing::info!("No pending recipients");
            return BatchResult::default();
        }

        tracing::info!(
            selected,
            max_concurrency = self.max_concurrency,
            "Dispatching batch"
        );

        let aggregator = Arc::new(ResultAggregator::new());
        let mut join_set: JoinSet<()> = JoinSet::new();
        let mut pending = recipients.into_iter();
        let mut panicked = 0usize;

        for recipient in pending.by_ref().take(self.max_concurrency) {
            self.spawn_worker(&mut join_set, recipient, &message, &aggregator);
        }

        // As workers finish, spawn new ones for the remaining recipients
        while let Some(joined) = join_set.join_next().await {
            if let Err(join_error) = joined {
                panicked += 1;
                tracing::error!(error = %join_error, "Delivery worker panicked");
            }
            if let Some(recipient) = pending.next() {
                self.spawn_worker(&mut join_set, recipient, &message, &aggregator);
            }
        }

        let (result, tally) = aggregator.snapshot();

        tracing::info!(
            selected,
            sent = tally.sent,
            transport_failed = tally.transport_failed,
            record_failed = tally.record_failed,
            failures = ?tally.failures,
            first_error = ?tally.first_error,
            panicked,
            "Batch complete"
        );

        result
    }

    fn spawn_worker(
        &self,
        join_set: &mut JoinSet<()>,
        recipient: Recipient,
        message: &Arc<MessageTemplate>,
        aggregator: &Arc<ResultAggregator>,
    ) {
        let worker = Arc::clone(&self.worker);
        let message = Arc::clone(message);
        let aggregator = Arc::clone(aggregator);

        join_set.spawn(
            async move {
                let attempt = worker.deliver(recipient, &message).await;
                aggregator.record(attempt);
            }
            .instrument(tracing::Span::current()),
        );
    }
}
