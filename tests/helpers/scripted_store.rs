//! A `DocumentStore` whose bulk insert outcome is fixed up front.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use docstore::domain::errors::{BulkWriteFailure, IndexedFailure, StoreError, WriteFailure};
use docstore::domain::models::{Filter, QueryOptions, StoredDocument};
use docstore::domain::ports::{DocumentStore, UpdateOutcome};
use serde_json::Value;

pub struct ScriptedStore {
    outcome: Result<usize, StoreError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    ordered: Mutex<Vec<bool>>,
}

impl ScriptedStore {
    /// Every insert succeeds.
    pub fn succeeding() -> Self {
        Self::with_outcome(Ok(0))
    }

    /// Every insert fails with `error`.
    pub fn failing(error: StoreError) -> Self {
        Self::with_outcome(Err(error))
    }

    /// Every insert reports duplicate keys at `indices`, in the given order.
    pub fn rejecting(indices: &[usize]) -> Self {
        let failures = indices
            .iter()
            .map(|&i| IndexedFailure::new(i, WriteFailure::duplicate_key(format!("dup at {i}"))))
            .collect();
        Self::failing(StoreError::BulkWrite(BulkWriteFailure::new(failures)))
    }

    /// Every insert succeeds, but only after `delay`.
    pub fn stalling(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::succeeding()
        }
    }

    fn with_outcome(outcome: Result<usize, StoreError>) -> Self {
        Self {
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
            ordered: Mutex::new(Vec::new()),
        }
    }

    /// Number of store calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The `ordered` flag of each `insert_many` call.
    pub fn ordered_flags(&self) -> Vec<bool> {
        self.ordered.lock().unwrap().clone()
    }

    fn not_scripted(&self) -> StoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StoreError::Backend("not scripted".to_string())
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    fn driver(&self) -> &'static str {
        "scripted"
    }

    async fn insert_one(&self, _document: StoredDocument) -> Result<(), StoreError> {
        Err(self.not_scripted())
    }

    async fn insert_many(
        &self,
        documents: Vec<StoredDocument>,
        ordered: bool,
    ) -> Result<usize, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ordered.lock().unwrap().push(ordered);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.outcome {
            Ok(_) => Ok(documents.len()),
            Err(err) => Err(err.clone()),
        }
    }

    async fn find_one(&self, _filter: &Filter) -> Result<Option<Value>, StoreError> {
        Err(self.not_scripted())
    }

    async fn find(
        &self,
        _filter: &Filter,
        _options: &QueryOptions,
    ) -> Result<Vec<Value>, StoreError> {
        Err(self.not_scripted())
    }

    async fn update_one(
        &self,
        _filter: &Filter,
        _document: StoredDocument,
        _upsert: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        Err(self.not_scripted())
    }

    async fn delete_one(&self, _filter: &Filter) -> Result<u64, StoreError> {
        Err(self.not_scripted())
    }

    async fn delete_many(&self, _filter: &Filter) -> Result<u64, StoreError> {
        Err(self.not_scripted())
    }

    async fn count_documents(&self, _filter: &Filter) -> Result<u64, StoreError> {
        Err(self.not_scripted())
    }

    async fn distinct(&self, _field: &str, _filter: &Filter) -> Result<Vec<Value>, StoreError> {
        Err(self.not_scripted())
    }
}
