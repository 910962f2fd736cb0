use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Store-assigned, immutable recipient identifier.
pub type RecipientId = i64;

/// A pending recipient as returned by selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipient {
    pub id: RecipientId,
    pub email: String,
}

/// Full stored state of a recipient row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecipientRecord {
    pub id: RecipientId,
    pub email: String,
    /// Flips false -> true at most once and never back.
    pub has_sent: bool,
    /// Set only on the transition to delivered.
    pub updated_at: Option<DateTime<Utc>>,
}

impl RecipientRecord {
    pub fn recipient(&self) -> Recipient {
        Recipient {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

/// The fixed message sent to every recipient of a batch.
///
/// Built from configuration by the caller; the engine never generates content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub from: String,
    pub subject: String,
    pub html_body: String,
    /// File identifiers resolved before every send.
    pub attachments: Vec<String>,
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Sent and durably recorded.
    Sent,
    /// Never reached the recipient; still pending.
    TransportFailed,
    /// Sent, but the delivered flag could not be written; still pending.
    RecordFailed,
}

impl std::fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryOutcome::Sent => write!(f, "sent"),
            DeliveryOutcome::TransportFailed => write!(f, "transport_failed"),
            DeliveryOutcome::RecordFailed => write!(f, "record_failed"),
        }
    }
}

/// Ephemeral result of one worker; consumed by the aggregator and never persisted.
#[derive(Debug, Clone)]
pub struct DeliveryAttempt {
    pub recipient: Recipient,
    pub outcome: DeliveryOutcome,
    /// Machine-readable failure reason, e.g. `attachment_missing` or `record_timeout`.
    pub reason: Option<&'static str>,
    pub error: Option<DispatchError>,
}

impl DeliveryAttempt {
    pub fn sent(recipient: Recipient) -> Self {
        Self {
            recipient,
            outcome: DeliveryOutcome::Sent,
            reason: None,
            error: None,
        }
    }

    pub fn transport_failed(
        recipient: Recipient,
        reason: &'static str,
        error: DispatchError,
    ) -> Self {
        Self {
            recipient,
            outcome: DeliveryOutcome::TransportFailed,
            reason: Some(reason),
            error: Some(error),
        }
    }

    pub fn record_failed(recipient: Recipient, reason: &'static str, error: DispatchError) -> Self {
        Self {
            recipient,
            outcome: DeliveryOutcome::RecordFailed,
            reason: Some(reason),
            error: Some(error),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.outcome == DeliveryOutcome::Sent
    }
}

/// Summary handed back to the trigger once every worker of a batch has finished.
///
/// Only durably committed deliveries appear here. `sent_emails` is in
/// completion order, which is not deterministic across workers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub count: usize,
    #[serde(rename = "sentEmails")]
    pub sent_emails: Vec<String>,
}
