//! In-process implementation of the DocumentStore port.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::errors::{BulkWriteFailure, IndexedFailure, StoreError, WriteFailure};
use crate::domain::models::query::{apply_projection, apply_set, lookup_path};
use crate::domain::models::{Filter, QueryOptions, RecordKey, SortDirection, StoredDocument};
use crate::domain::ports::{DocumentStore, UpdateOutcome};

type Collection = BTreeMap<RecordKey, Value>;

/// Shared state behind every collection handed out by one memory database.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    collections: Arc<RwLock<HashMap<String, Arc<RwLock<Collection>>>>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (creating on first use) the collection stored under `namespace`.
    pub async fn collection(&self, namespace: &str) -> InMemoryDocumentStore {
        let mut collections = self.collections.write().await;
        let data = collections
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Collection::new())))
            .clone();
        InMemoryDocumentStore { data }
    }
}

/// A single collection held in memory.
///
/// Keys are unique exactly like `_id` in a real store, so ordered and
/// unordered bulk inserts fail the same way they would against a server.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    data: Arc<RwLock<Collection>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn duplicate(key: &RecordKey) -> WriteFailure {
        WriteFailure::duplicate_key(format!("duplicate key: {{ _id: \"{key}\" }}"))
    }
}

fn compare_field(a: &Value, b: &Value, field: &str) -> std::cmp::Ordering {
    let left = lookup_path(a, field);
    let right = lookup_path(b, field);
    match (left, right) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(std::cmp::Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None | Some(Value::Null)) => std::cmp::Ordering::Greater,
        _ => std::cmp::Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn driver(&self) -> &'static str {
        "memory"
    }

    async fn insert_one(&self, document: StoredDocument) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        if data.contains_key(&document.key) {
            return Err(StoreError::Write(Self::duplicate(&document.key)));
        }
        let body = document.persisted_body();
        data.insert(document.key, body);
        Ok(())
    }

    async fn insert_many(
        &self,
        documents: Vec<StoredDocument>,
        ordered: bool,
    ) -> Result<usize, StoreError> {
        let mut data = self.data.write().await;
        let mut failures = Vec::new();
        let mut inserted = 0;

        for (index, document) in documents.into_iter().enumerate() {
            if data.contains_key(&document.key) {
                failures.push(IndexedFailure::new(index, Self::duplicate(&document.key)));
                if ordered {
                    break;
                }
                continue;
            }
            let body = document.persisted_body();
            data.insert(document.key, body);
            inserted += 1;
        }

        if failures.is_empty() {
            Ok(inserted)
        } else {
            Err(StoreError::BulkWrite(BulkWriteFailure::new(failures)))
        }
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Value>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .iter()
            .find(|(key, body)| filter.matches(key, body))
            .map(|(_, body)| body.clone()))
    }

    async fn find(&self, filter: &Filter, options: &QueryOptions) -> Result<Vec<Value>, StoreError> {
        let data = self.data.read().await;
        let mut matched: Vec<Value> = data
            .iter()
            .filter(|(key, body)| filter.matches(key, body))
            .map(|(_, body)| body.clone())
            .collect();

        if !options.sort.is_empty() {
            matched.sort_by(|a, b| {
                options
                    .sort
                    .iter()
                    .map(|s| {
                        let ord = compare_field(a, b, &s.field);
                        match s.direction {
                            SortDirection::Asc => ord,
                            SortDirection::Desc => ord.reverse(),
                        }
                    })
                    .find(|ord| ord.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let offset = usize::try_from(options.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|body| match &options.projection {
                Some(fields) => apply_projection(body, fields),
                None => body,
            })
            .collect())
    }

    async fn update_one(
        &self,
        filter: &Filter,
        document: StoredDocument,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut data = self.data.write().await;
        let target = data
            .iter()
            .find(|(key, body)| filter.matches(key, body))
            .map(|(key, _)| key.clone());

        match target {
            Some(key) => {
                let modified = data
                    .get_mut(&key)
                    .is_some_and(|existing| apply_set(existing, document.body_without_key()));
                Ok(UpdateOutcome {
                    matched: 1,
                    modified: u64::from(modified),
                    upserted: false,
                })
            }
            None if upsert => {
                if data.contains_key(&document.key) {
                    return Err(StoreError::Write(Self::duplicate(&document.key)));
                }
                let body = document.persisted_body();
                data.insert(document.key, body);
                Ok(UpdateOutcome {
                    matched: 0,
                    modified: 0,
                    upserted: true,
                })
            }
            None => Ok(UpdateOutcome::default()),
        }
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut data = self.data.write().await;
        let target = data
            .iter()
            .find(|(key, body)| filter.matches(key, body))
            .map(|(key, _)| key.clone());
        Ok(target.and_then(|key| data.remove(&key)).map_or(0, |_| 1))
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut data = self.data.write().await;
        let before = data.len();
        data.retain(|key, body| !filter.matches(key, body));
        Ok((before - data.len()) as u64)
    }

    async fn count_documents(&self, filter: &Filter) -> Result<u64, StoreError> {
        let data = self.data.read().await;
        Ok(data.iter().filter(|(key, body)| filter.matches(key, body)).count() as u64)
    }

    async fn distinct(&self, field: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let data = self.data.read().await;
        let mut values: Vec<Value> = Vec::new();
        for (key, body) in data.iter() {
            if !filter.matches(key, body) {
                continue;
            }
            if let Some(value) = lookup_path(body, field) {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        Ok(values)
    }
}
