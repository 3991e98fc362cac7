//! Generic repository over a [`DocumentStore`].
//!
//! Every operation is one pass-through call to the store. The repository adds
//! four things on top: serde conversion between `T` and stored documents,
//! operation-tagged errors, an optional per-call deadline, and the bulk-insert
//! partitioning in [`super::bulk_insert`].

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::bulk_insert::{
    attribute_atomic, attribute_partial, AtomicSaveError, PartialSaveError, SAVE_ATOMIC,
    SAVE_PARTIAL_SUCCESS,
};
use crate::domain::errors::{DatabaseError, DatabaseResult, StoreError};
use crate::domain::models::{Filter, Page, QueryOptions, Record, RecordKey, StoredDocument};
use crate::domain::ports::DocumentStore;

/// Typed repository for records of type `T`.
pub struct Repository<T: Record> {
    store: Arc<dyn DocumentStore>,
    query_timeout: Option<Duration>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            query_timeout: self.query_timeout,
            _record: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    /// Create a repository over an already opened collection.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            query_timeout: None,
            _record: PhantomData,
        }
    }

    /// Abort any single store call that takes longer than `timeout`.
    ///
    /// Writes the store applied before the deadline are kept.
    #[must_use]
    pub const fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub const fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }

    pub fn driver(&self) -> &'static str {
        self.store.driver()
    }

    /// Run one store call under the configured deadline.
    async fn call<R, F>(&self, fut: F) -> Result<R, StoreError>
    where
        F: Future<Output = Result<R, StoreError>> + Send,
    {
        match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => fut.await,
        }
    }

    fn to_documents(operation: &str, records: &[T]) -> DatabaseResult<Vec<StoredDocument>> {
        records
            .iter()
            .map(|r| StoredDocument::from_record(r).map_err(|e| DatabaseError::new(operation, e)))
            .collect()
    }

    fn decode(operation: &str, body: Value) -> DatabaseResult<T> {
        serde_json::from_value(body).map_err(|e| DatabaseError::new(operation, e))
    }

    fn decode_all(operation: &str, bodies: Vec<Value>) -> DatabaseResult<Vec<T>> {
        bodies
            .into_iter()
            .map(|body| Self::decode(operation, body))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Create
    // ---------------------------------------------------------------------

    /// Insert a single record.
    #[instrument(skip_all, fields(driver = self.driver(), key = %record.key()))]
    pub async fn save(&self, record: &T) -> DatabaseResult<()> {
        let document =
            StoredDocument::from_record(record).map_err(|e| DatabaseError::new("save", e))?;
        self.call(self.store.insert_one(document))
            .await
            .map_err(|e| DatabaseError::new("save", e))?;
        debug!("record saved");
        Ok(())
    }

    /// Insert a batch in order, stopping at the first failure, without
    /// reporting which record failed.
    #[instrument(skip_all, fields(driver = self.driver(), batch = records.len()))]
    pub async fn save_all(&self, records: &[T]) -> DatabaseResult<()> {
        if records.is_empty() {
            return Err(DatabaseError::invalid_argument(
                "save_all",
                "entities slice is empty (length: 0)",
            ));
        }
        let documents = Self::to_documents("save_all", records)?;
        let inserted = self
            .call(self.store.insert_many(documents, true))
            .await
            .map_err(|e| DatabaseError::new("save_all", e))?;
        debug!(inserted, "batch saved");
        Ok(())
    }

    /// Insert a batch in order and report the first record that failed.
    ///
    /// Records before the failed one are committed; it and everything after
    /// it are not. Returns `Ok(())` when the whole batch was committed.
    #[instrument(skip_all, fields(driver = self.driver(), batch = records.len()))]
    pub async fn save_atomic(&self, records: &[T]) -> Result<(), AtomicSaveError<T>> {
        if records.is_empty() {
            return Err(AtomicSaveError::unattributed(DatabaseError::invalid_argument(
                SAVE_ATOMIC,
                "entities cannot be empty",
            )));
        }
        let documents =
            Self::to_documents(SAVE_ATOMIC, records).map_err(AtomicSaveError::unattributed)?;

        let outcome = self.call(self.store.insert_many(documents, true)).await;
        let result = attribute_atomic(records, outcome);

        if let Err(ref err) = result {
            warn!(
                index = ?err.index,
                key = ?err.record.as_ref().map(T::key),
                error = %err.error,
                "atomic save stopped"
            );
        }
        result
    }

    /// Insert a batch without ordering and report every record that failed.
    ///
    /// Every record not returned was committed. Returns `Ok(())` when the
    /// whole batch was committed.
    #[instrument(skip_all, fields(driver = self.driver(), batch = records.len()))]
    pub async fn save_partial_success(&self, records: &[T]) -> Result<(), PartialSaveError<T>> {
        if records.is_empty() {
            return Err(PartialSaveError::unattributed(DatabaseError::invalid_argument(
                SAVE_PARTIAL_SUCCESS,
                "entities cannot be empty",
            )));
        }
        let documents = Self::to_documents(SAVE_PARTIAL_SUCCESS, records)
            .map_err(PartialSaveError::unattributed)?;

        let outcome = self.call(self.store.insert_many(documents, false)).await;
        let result = attribute_partial(records, outcome);

        if let Err(ref err) = result {
            warn!(
                failed = err.failed.len(),
                attempted = records.len(),
                error = %err.error,
                "partial save left records behind"
            );
        }
        result
    }

    // ---------------------------------------------------------------------
    // Read
    // ---------------------------------------------------------------------

    pub async fn find(&self, filter: &Filter, options: &QueryOptions) -> DatabaseResult<Vec<T>> {
        let bodies = self
            .call(self.store.find(filter, options))
            .await
            .map_err(|e| DatabaseError::new("find", e))?;
        Self::decode_all("find", bodies)
    }

    pub async fn find_one(&self, filter: &Filter) -> DatabaseResult<Option<T>> {
        let body = self
            .call(self.store.find_one(filter))
            .await
            .map_err(|e| DatabaseError::new("find_one", e))?;
        body.map(|b| Self::decode("find_one", b)).transpose()
    }

    /// Look a record up by key. A missing record is `Ok(None)`.
    pub async fn find_by_id(&self, key: &RecordKey) -> DatabaseResult<Option<T>> {
        let body = self
            .call(self.store.find_one(&Filter::by_key(key.clone())))
            .await
            .map_err(|e| DatabaseError::new("find_by_id", e))?;
        body.map(|b| Self::decode("find_by_id", b)).transpose()
    }

    pub async fn find_by_ids(&self, keys: &[RecordKey]) -> DatabaseResult<Vec<T>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let filter = Filter::by_keys(keys.iter().cloned());
        let bodies = self
            .call(self.store.find(&filter, &QueryOptions::default()))
            .await
            .map_err(|e| DatabaseError::new("find_by_ids", e))?;
        Self::decode_all("find_by_ids", bodies)
    }

    pub async fn find_all(&self) -> DatabaseResult<Vec<T>> {
        let bodies = self
            .call(self.store.find(&Filter::all(), &QueryOptions::default()))
            .await
            .map_err(|e| DatabaseError::new("find_all", e))?;
        Self::decode_all("find_all", bodies)
    }

    /// One page of results plus the total number of matches.
    pub async fn find_paginated(
        &self,
        filter: &Filter,
        options: &QueryOptions,
    ) -> DatabaseResult<Page<T>> {
        let total = self
            .call(self.store.count_documents(filter))
            .await
            .map_err(|e| DatabaseError::new("find_paginated", e))?;
        let bodies = self
            .call(self.store.find(filter, options))
            .await
            .map_err(|e| DatabaseError::new("find_paginated", e))?;
        Ok(Page {
            items: Self::decode_all("find_paginated", bodies)?,
            total,
        })
    }

    pub async fn distinct(&self, field: &str, filter: &Filter) -> DatabaseResult<Vec<Value>> {
        if field.trim().is_empty() {
            return Err(DatabaseError::invalid_argument("distinct", "field cannot be empty"));
        }
        self.call(self.store.distinct(field, filter))
            .await
            .map_err(|e| DatabaseError::new("distinct", e))
    }

    // ---------------------------------------------------------------------
    // Update
    // ---------------------------------------------------------------------

    /// Overwrite the fields of the record stored under `key`.
    pub async fn update(&self, key: &RecordKey, record: &T) -> DatabaseResult<()> {
        self.update_matching("update", &Filter::by_key(key.clone()), record, key.as_str())
            .await
    }

    /// Overwrite the fields of the first record matching `filter`.
    pub async fn update_by_filter(&self, filter: &Filter, record: &T) -> DatabaseResult<()> {
        self.update_matching("update_by_filter", filter, record, "no document matched filter")
            .await
    }

    async fn update_matching(
        &self,
        operation: &str,
        filter: &Filter,
        record: &T,
        missing: &str,
    ) -> DatabaseResult<()> {
        let document =
            StoredDocument::from_record(record).map_err(|e| DatabaseError::new(operation, e))?;
        let outcome = self
            .call(self.store.update_one(filter, document, false))
            .await
            .map_err(|e| DatabaseError::new(operation, e))?;
        if outcome.matched == 0 {
            return Err(DatabaseError::not_found(operation, missing));
        }
        debug!(operation, modified = outcome.modified, "record updated");
        Ok(())
    }

    /// Update the first record matching `filter`, or insert `record` under
    /// its own key. Returns true when a new record was inserted.
    pub async fn upsert(&self, filter: &Filter, record: &T) -> DatabaseResult<bool> {
        let document =
            StoredDocument::from_record(record).map_err(|e| DatabaseError::new("upsert", e))?;
        let outcome = self
            .call(self.store.update_one(filter, document, true))
            .await
            .map_err(|e| DatabaseError::new("upsert", e))?;
        Ok(outcome.upserted)
    }

    // ---------------------------------------------------------------------
    // Delete
    // ---------------------------------------------------------------------

    pub async fn delete(&self, key: &RecordKey) -> DatabaseResult<()> {
        let deleted = self
            .call(self.store.delete_one(&Filter::by_key(key.clone())))
            .await
            .map_err(|e| DatabaseError::new("delete", e))?;
        if deleted == 0 {
            return Err(DatabaseError::not_found("delete", key.as_str()));
        }
        Ok(())
    }

    pub async fn delete_by_filter(&self, filter: &Filter) -> DatabaseResult<u64> {
        self.call(self.store.delete_many(filter))
            .await
            .map_err(|e| DatabaseError::new("delete_by_filter", e))
    }

    pub async fn delete_all(&self) -> DatabaseResult<u64> {
        let deleted = self
            .call(self.store.delete_many(&Filter::all()))
            .await
            .map_err(|e| DatabaseError::new("delete_all", e))?;
        debug!(deleted, "collection cleared");
        Ok(deleted)
    }

    // ---------------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------------

    pub async fn count(&self) -> DatabaseResult<u64> {
        self.call(self.store.count_documents(&Filter::all()))
            .await
            .map_err(|e| DatabaseError::new("count", e))
    }

    pub async fn count_by_filter(&self, filter: &Filter) -> DatabaseResult<u64> {
        self.call(self.store.count_documents(filter))
            .await
            .map_err(|e| DatabaseError::new("count_by_filter", e))
    }

    pub async fn exists_by_id(&self, key: &RecordKey) -> DatabaseResult<bool> {
        let count = self
            .call(self.store.count_documents(&Filter::by_key(key.clone())))
            .await
            .map_err(|e| DatabaseError::new("exists_by_id", e))?;
        Ok(count > 0)
    }

    /// # Errors
    /// `InvalidArgument` for an empty filter; use [`Self::count`] instead.
    pub async fn exists_by_filter(&self, filter: &Filter) -> DatabaseResult<bool> {
        if filter.is_empty() {
            return Err(DatabaseError::invalid_argument("exists_by_filter", "filter is empty"));
        }
        let count = self
            .call(self.store.count_documents(filter))
            .await
            .map_err(|e| DatabaseError::new("exists_by_filter", e))?;
        Ok(count > 0)
    }
}
