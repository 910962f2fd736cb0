//! Batch dispatch-and-record engine.
//!
//! One batch runs through four stages:
//! 1. [`selector`] reads up to N recipients that are not yet delivered
//! 2. [`coordinator`] fans them out over a bounded pool of workers and waits for all
//! 3. [`worker`] sends the message and, only on success, asks [`recorder`] to commit
//! 4. [`aggregator`] collects every attempt into the returned summary

pub mod aggregator;
pub mod coordinator;
pub mod recorder;
pub mod selector;
pub mod store;
pub mod worker;

pub use coordinator::{DispatchSettings, Dispatcher};
pub use store::{MemoryRecipientStore, PgRecipientStore, RecipientStore};
