//! Resend HTTP API transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::transport::{OutboundEmail, Transport, TransportError};

const BASE64_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Transport that posts each message to the Resend `/emails` endpoint.
///
/// The underlying `reqwest::Client` pools connections, so one instance is
/// shared by every worker of every batch.
#[derive(Clone)]
pub struct ResendTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct AttachmentPayload<'a> {
    filename: &'a str,
    content: String,
}

impl ResendTransport {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl Transport for ResendTransport {
    #[tracing::instrument(skip_all, fields(to = %email.to))]
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        let body = SendEmailRequest {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html_body,
            attachments: email
                .attachments
                .iter()
                .map(|a| AttachmentPayload {
                    filename: &a.filename,
                    content: base64_encode(&a.content),
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "Resend accepted message");
            return Ok(());
        }

        let status = status.as_u16();
        if status == 401 || status == 403 {
            return Err(TransportError::Auth(status));
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Rejected { status, body })
    }
}

/// Standard padded base64, unwrapped, as the JSON API expects.
fn base64_encode(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let mut buf = [0u8; 3];
        buf[..chunk.len()].copy_from_slice(chunk);

        let b1 = (buf[0] >> 2) as usize;
        let b2 = (((buf[0] & 0x03) << 4) | (buf[1] >> 4)) as usize;
        let b3 = (((buf[1] & 0x0F) << 2) | (buf[2] >> 6)) as usize;
        let b4 = (buf[2] & 0x3F) as usize;

        result.push(BASE64_ALPHABET[b1] as char);
        result.push(BASE64_ALPHABET[b2] as char);
        result.push(if chunk.len() > 1 {
            BASE64_ALPHABET[b3] as char
        } else {
            '='
        });
        result.push(if chunk.len() > 2 {
            BASE64_ALPHABET[b4] as char
        } else {
            '='
        });
    }

    result
}
