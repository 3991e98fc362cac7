use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::StoreError;
use crate::domain::models::{Filter, QueryOptions, StoredDocument};

/// Result of an `update_one` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
    /// True when no document matched and a new one was inserted.
    pub upserted: bool,
}

/// One collection of a document database.
///
/// This is the driver contract the repository is written against. Adapters
/// translate each call into a single driver round trip and map driver errors
/// onto [`StoreError`]; they never retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short driver name for logs, e.g. `sqlite` or `mongodb`.
    fn driver(&self) -> &'static str;

    /// Insert one document.
    ///
    /// # Errors
    /// `StoreError::Write` with `DuplicateKey` when the key already exists.
    async fn insert_one(&self, document: StoredDocument) -> Result<(), StoreError>;

    /// Insert a batch of documents and return how many were inserted.
    ///
    /// With `ordered` the store applies documents in input order and stops at
    /// the first rejection. Without it every document is attempted. Rejections
    /// are reported as `StoreError::BulkWrite`, indexed by position in
    /// `documents`. Documents accepted before an error stay committed.
    async fn insert_many(
        &self,
        documents: Vec<StoredDocument>,
        ordered: bool,
    ) -> Result<usize, StoreError>;

    /// First document matching `filter`, as stored.
    async fn find_one(&self, filter: &Filter) -> Result<Option<Value>, StoreError>;

    /// All documents matching `filter`, shaped by `options`.
    async fn find(&self, filter: &Filter, options: &QueryOptions)
        -> Result<Vec<Value>, StoreError>;

    /// Set the fields of `document` on the first document matching `filter`.
    ///
    /// With `upsert`, inserts `document` under its key when nothing matches.
    async fn update_one(
        &self,
        filter: &Filter,
        document: StoredDocument,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Delete the first document matching `filter`; returns the deleted count.
    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Delete every document matching `filter`; returns the deleted count.
    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn count_documents(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Distinct values of `field` among documents matching `filter`.
    async fn distinct(&self, field: &str, filter: &Filter) -> Result<Vec<Value>, StoreError>;
}
