//! Shared application state for the Axum API server.

use std::sync::Arc;

use mailbatch_common::types::MessageTemplate;
use mailbatch_engine::Dispatcher;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub message: Arc<MessageTemplate>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, message: MessageTemplate) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            message: Arc::new(message),
        }
    }
}
