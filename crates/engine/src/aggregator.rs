//! Result aggregator, the only state shared between workers of a batch.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use mailbatch_common::error::DispatchError;
use mailbatch_common::types::{BatchResult, DeliveryAttempt, DeliveryOutcome};

/// Per-outcome counters of one batch, for the operational log.
#[derive(Debug, Clone, Default)]
pub struct AttemptTally {
    pub observed: usize,
    pub sent: usize,
    pub transport_failed: usize,
    pub record_failed: usize,
    /// Failed attempts keyed by reason code.
    pub failures: BTreeMap<&'static str, usize>,
    /// Error of the first failed attempt observed.
    pub first_error: Option<DispatchError>,
}

#[derive(Debug, Default)]
struct Accumulator {
    result: BatchResult,
    tally: AttemptTally,
}

/// Collects delivery attempts from concurrent workers under a single lock.
///
/// Only `sent` attempts contribute to the [`BatchResult`]; `count` and
/// `sent_emails` are updated together, so they can never disagree.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    inner: Mutex<Accumulator>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, attempt: DeliveryAttempt) {
        let mut acc = self.inner.lock();
        acc.tally.observed += 1;
        if attempt.is_sent() {
            acc.tally.sent += 1;
            acc.result.count += 1;
            acc.result.sent_emails.push(attempt.recipient.email);
            return;
        }

        match attempt.outcome {
            DeliveryOutcome::TransportFailed => acc.tally.transport_failed += 1,
            DeliveryOutcome::RecordFailed => acc.tally.record_failed += 1,
            DeliveryOutcome::Sent => {}
        }
        *acc.tally
            .failures
            .entry(attempt.reason.unwrap_or("unknown"))
            .or_default() += 1;
        if acc.tally.first_error.is_none() {
            acc.tally.first_error = attempt.error;
        }
    }

    /// Immutable copy of the result and counters accumulated so far.
    pub fn snapshot(&self) -> (BatchResult, AttemptTally) {
        let acc = self.inner.lock();
        (acc.result.clone(), acc.tally.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mailbatch_common::types::Recipient;

    use super::*;

    fn recipient(id: i64) -> Recipient {
        Recipient {
            id,
            email: format!("user{}@x.io", id),
        }
    }

    #[test]
    fn test_only_sent_attempts_are_counted() {
        let aggregator = ResultAggregator::new();
        aggregator.record(DeliveryAttempt::sent(recipient(1)));
        aggregator.record(DeliveryAttempt::transport_failed(
            recipient(2),
            "transport_error",
            DispatchError::Transport("refused".into()),
        ));
        aggregator.record(DeliveryAttempt::record_failed(
            recipient(3),
            "record_timeout",
            DispatchError::Record("timed out".into()),
        ));

        let (result, tally) = aggregator.snapshot();
        assert_eq!(result.count, 1);
        assert_eq!(result.sent_emails, vec!["user1@x.io".to_string()]);
        assert_eq!(tally.observed, 3);
        assert_eq!(tally.sent, 1);
        assert_eq!(tally.transport_failed, 1);
        assert_eq!(tally.record_failed, 1);
        assert_eq!(tally.failures.get("transport_error"), Some(&1));
        assert_eq!(tally.failures.get("record_timeout"), Some(&1));
        assert!(matches!(
            tally.first_error,
            Some(DispatchError::Transport(_))
        ));
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let aggregator = Arc::new(ResultAggregator::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let aggregator = aggregator.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        aggregator.record(DeliveryAttempt::sent(recipient(t * 1000 + i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let (result, tally) = aggregator.snapshot();
        assert_eq!(result.count, 2000);
        assert_eq!(result.sent_emails.len(), result.count);
        assert_eq!(tally.observed, 2000);
    }
}
