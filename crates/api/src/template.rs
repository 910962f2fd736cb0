//! Builds the fixed batch message from configuration.

use std::path::Path;

use anyhow::Context;

use mailbatch_common::config::AppConfig;
use mailbatch_common::types::MessageTemplate;

/// Load the message every recipient of a batch receives.
///
/// The HTML body is read once at startup; attachments are only named here
/// and resolved again before every send.
pub fn load_template(config: &AppConfig) -> anyhow::Result<MessageTemplate> {
    let html_body = read_body(Path::new(&config.mail_body_path))?;

    Ok(MessageTemplate {
        from: config.mail_from.clone(),
        subject: config.mail_subject.clone(),
        html_body,
        attachments: config.mail_attachments.clone(),
    })
}

fn read_body(path: &Path) -> anyhow::Result<String> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read message body from {}", path.display()))?;
    if body.trim().is_empty() {
        anyhow::bail!("message body at {} is empty", path.display());
    }
    Ok(body)
}
