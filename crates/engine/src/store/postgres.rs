use async_trait::async_trait;
use sqlx::PgPool;

use mailbatch_common::error::StoreError;
use mailbatch_common::types::{Recipient, RecipientId, RecipientRecord};

use super::RecipientStore;

/// Recipient store backed by the `emails` table.
#[derive(Clone)]
pub struct PgRecipientStore {
    pool: PgPool,
}

impl PgRecipientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a pending recipient and return its id.
    pub async fn insert(&self, email: &str) -> Result<RecipientId, StoreError> {
        let (id,): (i64,) = sqlx::query_as("INSERT INTO emails (email) VALUES ($1) RETURNING id")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    /// Load the full stored state of one recipient.
    pub async fn fetch(&self, id: RecipientId) -> Result<Option<RecipientRecord>, StoreError> {
        let record = sqlx::query_as::<_, RecipientRecord>(
            "SELECT id, email, has_sent, updated_at FROM emails WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}

#[async_trait]
impl RecipientStore for PgRecipientStore {
    async fn select_pending(&self, limit: i64) -> Result<Vec<Recipient>, StoreError> {
        let recipients = sqlx::query_as::<_, Recipient>(
            "SELECT id, email FROM emails WHERE has_sent = false ORDER BY id LIMIT $1",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients)
    }

    async fn mark_delivered(&self, id: RecipientId) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE emails SET has_sent = true, updated_at = NOW() WHERE id = $1 AND has_sent = false",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing updated: either the row is gone or another batch got there first.
        match self.fetch(id).await? {
            Some(_) => Err(StoreError::Conflict(id)),
            None => Err(StoreError::NotFound(id)),
        }
    }
}
