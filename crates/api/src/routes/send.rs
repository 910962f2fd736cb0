//! Batch trigger route.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use mailbatch_common::error::AppError;
use mailbatch_common::types::BatchResult;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/send-email", post(send_email))
}

/// Request body for a batch run. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    /// Maximum number of recipients to process; a missing value means 0.
    #[serde(default)]
    pub batch: i64,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub result: BatchResult,
}

/// POST /send-email: deliver the configured message to the next batch of pending recipients.
async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<SendEmailResponse>, AppError> {
    let Json(req) = payload?;

    let result = state
        .dispatcher
        .run_batch(req.batch, state.message.clone())
        .await?;

    tracing::info!(
        batch = req.batch,
        count = result.count,
        "Batch request served"
    );

    Ok(Json(SendEmailResponse {
        status: "Emails sent successfully",
        result,
    }))
}
