use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::transport::Attachment;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("attachment {0} not found")]
    NotFound(String),

    #[error("attachment {file} unreadable: {detail}")]
    Unreadable { file: String, detail: String },
}

/// Resolves attachment identifiers into bytes.
///
/// Called before every send; implementations may cache but are not required to.
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    async fn resolve(&self, file_id: &str) -> Result<Attachment, AttachmentError>;
}

/// Reads attachments from disk, relative to a base directory.
#[derive(Debug, Clone)]
pub struct FsAttachmentSource {
    base_dir: PathBuf,
}

impl FsAttachmentSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, file_id: &str) -> PathBuf {
        self.base_dir.join(file_id)
    }
}

#[async_trait]
impl AttachmentSource for FsAttachmentSource {
    async fn resolve(&self, file_id: &str) -> Result<Attachment, AttachmentError> {
        let path = self.path_for(file_id);
        let content = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AttachmentError::NotFound(file_id.to_string()),
            _ => AttachmentError::Unreadable {
                file: file_id.to_string(),
                detail: e.to_string(),
            },
        })?;

        let filename = Path::new(file_id)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_id.to_string());

        tracing::trace!(file = %file_id, bytes = content.len(), "Resolved attachment");
        Ok(Attachment { filename, content })
    }
}
