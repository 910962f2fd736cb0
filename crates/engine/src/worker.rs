//! Delivery worker: one recipient, one attempt.
//!
//! Steps, in order:
//! 1. Resolve every attachment of the message. A missing file ends the
//!    attempt as `transport_failed` before the transport is touched.
//! 2. Send through the transport. Any transport error ends the attempt as
//!    `transport_failed`; the recipient stays pending.
//! 3. Only after a successful send, ask the state recorder to mark this one
//!    recipient delivered. A failed write ends the attempt as
//!    `record_failed`: the message went out but the recipient stays pending
//!    and may receive it again from a later batch.

use std::sync::Arc;

use mailbatch_common::error::DispatchError;
use mailbatch_common::types::{DeliveryAttempt, MessageTemplate, Recipient};
use mailbatch_notifier::{AttachmentError, AttachmentSource, OutboundEmail, Transport};

use crate::recorder::StateRecorder;

pub struct DeliveryWorker {
    transport: Arc<dyn Transport>,
    attachments: Arc<dyn AttachmentSource>,
    recorder: StateRecorder,
}

impl DeliveryWorker {
    pub fn new(
        transport: Arc<dyn Transport>,
        attachments: Arc<dyn AttachmentSource>,
        recorder: StateRecorder,
    ) -> Self {
        Self {
            transport,
            attachments,
            recorder,
        }
    }

    #[tracing::instrument(skip_all, fields(recipient_id = recipient.id, email = %recipient.email))]
    pub async fn deliver(&self, recipient: Recipient, message: &MessageTemplate) -> DeliveryAttempt {
        let mut attachments = Vec::with_capacity(message.attachments.len());
        for file_id in &message.attachments {
            match self.attachments.resolve(file_id).await {
                Ok(attachment) => attachments.push(attachment),
                Err(e) => {
                    let reason = match e {
                        AttachmentError::NotFound(_) => "attachment_missing",
                        AttachmentError::Unreadable { .. } => "attachment_unreadable",
                    };
                    tracing::warn!(file = %file_id, error = %e, "Failed to attach file");
                    return DeliveryAttempt::transport_failed(
                        recipient,
                        reason,
                        DispatchError::AttachmentMissing {
                            file: file_id.clone(),
                            detail: e.to_string(),
                        },
                    );
                }
            }
        }

        let email = OutboundEmail {
            from: message.from.clone(),
            to: recipient.email.clone(),
            subject: message.subject.clone(),
            html_body: message.html_body.clone(),
            attachments,
        };

        if let Err(e) = self.transport.send(&email).await {
            tracing::warn!(error = %e, "Failed to send email");
            return DeliveryAttempt::transport_failed(
                recipient,
                "transport_error",
                DispatchError::Transport(e.to_string()),
            );
        }

        if let Err(e) = self.recorder.mark_delivered(recipient.id).await {
            tracing::error!(
                error = %e,
                reason = e.reason(),
                "Email sent but not recorded as delivered; recipient stays eligible and may be sent again"
            );
            return DeliveryAttempt::record_failed(
                recipient,
                e.reason(),
                DispatchError::Record(e.to_string()),
            );
        }

        tracing::debug!("Email delivered and recorded");
        DeliveryAttempt::sent(recipient)
    }
}
