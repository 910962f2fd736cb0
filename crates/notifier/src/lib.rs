//! Outbound delivery capabilities consumed by the dispatch engine.
//!
//! - [`transport`]: the `Transport` seam and the message shape it sends
//! - [`resend`]: production transport backed by the Resend HTTP API
//! - [`attachment`]: resolves attachment identifiers into file contents

pub mod attachment;
pub mod resend;
pub mod transport;

pub use attachment::{AttachmentError, AttachmentSource, FsAttachmentSource};
pub use resend::ResendTransport;
pub use transport::{Attachment, OutboundEmail, Transport, TransportError};
