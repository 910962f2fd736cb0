use async_trait::async_trait;
use thiserror::Error;

/// A resolved attachment ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One composed message addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

/// Transport failures. The engine treats every variant the same way; the
/// split only exists for logs.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication rejected (HTTP {0})")]
    Auth(u16),

    #[error("remote rejected message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Fallible external channel that delivers one message.
///
/// Implementations bound their own I/O time; the engine never wraps `send`
/// in a timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError>;
}
