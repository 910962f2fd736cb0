//! Durable recipient storage.
//!
//! The selector only reads through [`RecipientStore::select_pending`] and the
//! state recorder only writes through [`RecipientStore::mark_delivered`]; no
//! other component touches storage.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use mailbatch_common::error::StoreError;
use mailbatch_common::types::{Recipient, RecipientId};

pub use memory::MemoryRecipientStore;
pub use postgres::PgRecipientStore;

#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Return at most `limit` recipients that are not yet delivered.
    ///
    /// A `limit` of zero or below yields an empty list, not an error.
    async fn select_pending(&self, limit: i64) -> Result<Vec<Recipient>, StoreError>;

    /// Flip one recipient's delivered flag and stamp `updated_at`.
    ///
    /// Touches only the row keyed by `id`. Fails with
    /// [`StoreError::Conflict`] if the row is already delivered, so this
    /// succeeds at most once per recipient.
    async fn mark_delivered(&self, id: RecipientId) -> Result<(), StoreError>;
}
