//! MongoDB implementation of the DocumentStore port.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document};
use mongodb::options::{CountOptions, FindOptions, InsertManyOptions, UpdateOptions};
use mongodb::{Client, Collection};
use serde_json::Value;

use crate::domain::errors::StoreError;
use crate::domain::models::{Filter, QueryOptions, StoredDocument, KEY_FIELD};
use crate::domain::ports::{DocumentStore, UpdateOutcome};

use super::{
    filter_to_document, map_mongo_error, projection_document, sort_document, to_bson,
    to_insert_document, to_json,
};

#[derive(Clone)]
pub struct MongoDocumentStore {
    collection: Collection<Document>,
}

impl MongoDocumentStore {
    pub fn new(client: &Client, database: &str, collection: &str) -> Self {
        Self {
            collection: client.database(database).collection(collection),
        }
    }

    pub fn namespace(&self) -> String {
        self.collection.namespace().to_string()
    }

    /// `$set` of the body fields, plus `$setOnInsert` of the key when upserting.
    fn update_document(document: &StoredDocument, upsert: bool) -> Result<Document, StoreError> {
        let mut update = Document::new();
        if let Bson::Document(fields) = to_bson(&document.body_without_key())? {
            if !fields.is_empty() {
                update.insert("$set", fields);
            }
        }
        if upsert {
            let mut on_insert = Document::new();
            on_insert.insert(KEY_FIELD, to_bson(&document.key_value())?);
            update.insert("$setOnInsert", on_insert);
        }
        Ok(update)
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    fn driver(&self) -> &'static str {
        "mongodb"
    }

    async fn insert_one(&self, document: StoredDocument) -> Result<(), StoreError> {
        let doc = to_insert_document(&document)?;
        self.collection
            .insert_one(doc, None)
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn insert_many(
        &self,
        documents: Vec<StoredDocument>,
        ordered: bool,
    ) -> Result<usize, StoreError> {
        let docs = documents
            .iter()
            .map(to_insert_document)
            .collect::<Result<Vec<_>, _>>()?;

        let mut options = InsertManyOptions::default();
        options.ordered = Some(ordered);

        let result = self
            .collection
            .insert_many(docs, options)
            .await
            .map_err(map_mongo_error)?;
        Ok(result.inserted_ids.len())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Value>, StoreError> {
        let found = self
            .collection
            .find_one(filter_to_document(filter)?, None)
            .await
            .map_err(map_mongo_error)?;
        Ok(found.map(to_json))
    }

    async fn find(&self, filter: &Filter, options: &QueryOptions) -> Result<Vec<Value>, StoreError> {
        let mut find_options = FindOptions::default();
        find_options.sort = sort_document(options);
        find_options.projection = projection_document(options);
        find_options.limit = options.limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        find_options.skip = options.offset;

        let cursor = self
            .collection
            .find(filter_to_document(filter)?, find_options)
            .await
            .map_err(map_mongo_error)?;
        let docs: Vec<Document> = cursor.try_collect().await.map_err(map_mongo_error)?;
        Ok(docs.into_iter().map(to_json).collect())
    }

    async fn update_one(
        &self,
        filter: &Filter,
        document: StoredDocument,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        let filter = filter_to_document(filter)?;
        let update = Self::update_document(&document, upsert)?;

        // An empty update document is rejected by the server.
        if update.is_empty() {
            let mut options = CountOptions::default();
            options.limit = Some(1);
            let matched = self
                .collection
                .count_documents(filter, options)
                .await
                .map_err(map_mongo_error)?;
            return Ok(UpdateOutcome {
                matched,
                ..UpdateOutcome::default()
            });
        }

        let mut options = UpdateOptions::default();
        options.upsert = Some(upsert);
        let result = self
            .collection
            .update_one(filter, update, options)
            .await
            .map_err(map_mongo_error)?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted: result.upserted_id.is_some(),
        })
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        let result = self
            .collection
            .delete_one(filter_to_document(filter)?, None)
            .await
            .map_err(map_mongo_error)?;
        Ok(result.deleted_count)
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        let result = self
            .collection
            .delete_many(filter_to_document(filter)?, None)
            .await
            .map_err(map_mongo_error)?;
        Ok(result.deleted_count)
    }

    async fn count_documents(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.collection
            .count_documents(filter_to_document(filter)?, None)
            .await
            .map_err(map_mongo_error)
    }

    async fn distinct(&self, field: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let values = self
            .collection
            .distinct(field, filter_to_document(filter)?, None)
            .await
            .map_err(map_mongo_error)?;
        Ok(values.into_iter().map(Bson::into_relaxed_extjson).collect())
    }
}
