use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use mailbatch_common::error::StoreError;
use mailbatch_common::types::{Recipient, RecipientId, RecipientRecord};

use super::RecipientStore;

#[derive(Debug, Default)]
struct Rows {
    next_id: RecipientId,
    records: BTreeMap<RecipientId, RecipientRecord>,
}

/// In-process recipient store with the same semantics as the Postgres one.
///
/// Ids are assigned from 1 upwards and selection returns rows in id order.
#[derive(Debug, Default)]
pub struct MemoryRecipientStore {
    rows: Mutex<Rows>,
}

impl MemoryRecipientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for email in emails {
            store.insert(email);
        }
        store
    }

    /// Add a pending recipient and return its id.
    pub fn insert(&self, email: impl Into<String>) -> RecipientId {
        let mut rows = self.rows.lock();
        rows.next_id += 1;
        let id = rows.next_id;
        rows.records.insert(
            id,
            RecipientRecord {
                id,
                email: email.into(),
                has_sent: false,
                updated_at: None,
            },
        );
        id
    }

    pub fn get(&self, id: RecipientId) -> Option<RecipientRecord> {
        self.rows.lock().records.get(&id).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.rows
            .lock()
            .records
            .values()
            .filter(|r| !r.has_sent)
            .count()
    }
}

#[async_trait]
impl RecipientStore for MemoryRecipientStore {
    async fn select_pending(&self, limit: i64) -> Result<Vec<Recipient>, StoreError> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let rows = self.rows.lock();
        Ok(rows
            .records
            .values()
            .filter(|r| !r.has_sent)
            .take(limit)
            .map(RecipientRecord::recipient)
            .collect())
    }

    async fn mark_delivered(&self, id: RecipientId) -> Result<(), StoreError> {
        let mut rows = self.rows.lock();
        let record = rows.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.has_sent {
            return Err(StoreError::Conflict(id));
        }
        record.has_sent = true;
        record.updated_at = Some(Utc::now());
        Ok(())
    }
}
