use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::types::RecipientId;

/// SQLSTATE classes that mean the server went away rather than the query being wrong.
const UNAVAILABLE_SQLSTATE_PREFIXES: &[&str] = &["08", "53", "57P"];

/// Errors raised by a recipient store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Recipient {0} is already marked delivered")]
    Conflict(RecipientId),

    #[error("Recipient {0} not found")]
    NotFound(RecipientId),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db_err) => {
                let unavailable = db_err.code().is_some_and(|code| {
                    UNAVAILABLE_SQLSTATE_PREFIXES
                        .iter()
                        .any(|prefix| code.starts_with(prefix))
                });
                if unavailable {
                    StoreError::Unavailable(err.to_string())
                } else {
                    StoreError::Query(err.to_string())
                }
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// Batch and per-attempt failure taxonomy of the dispatch engine.
///
/// `StorageUnavailable` and `StorageQuery` abort a whole batch before any
/// worker is spawned. The remaining variants only ever describe a single
/// recipient's attempt and leave that recipient pending.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage query error: {0}")]
    StorageQuery(String),

    #[error("Attachment {file} missing: {detail}")]
    AttachmentMissing { file: String, detail: String },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Record failure: {0}")]
    Record(String),
}

impl From<StoreError> for DispatchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => DispatchError::StorageUnavailable(msg),
            other => DispatchError::StorageQuery(other.to_string()),
        }
    }
}

/// Errors surfaced through the trigger endpoint.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Dispatch(DispatchError::StorageUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::Dispatch(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to query database".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
