//! SQLite implementation of the DocumentStore port.
//!
//! Every collection lives in the shared `documents` table, keyed by
//! `(namespace, id)`. Bodies are stored as JSON text and queried with the
//! SQLite JSON1 functions.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::domain::errors::{BulkWriteFailure, IndexedFailure, StoreError};
use crate::domain::models::query::{apply_projection, apply_set};
use crate::domain::models::{Condition, Filter, QueryOptions, SortDirection, StoredDocument, KEY_FIELD};
use crate::domain::ports::{DocumentStore, UpdateOutcome};

use super::{map_sqlx_error, write_failure};

#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteDocumentStore {
    /// Collection `collection` of logical database `database`.
    pub fn new(pool: SqlitePool, database: &str, collection: &str) -> Self {
        Self {
            pool,
            namespace: format!("{database}.{collection}"),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn push_where(&self, builder: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
        builder
            .push(" WHERE namespace = ")
            .push_bind(self.namespace.clone());

        for condition in filter.conditions() {
            match condition {
                Condition::Key(key) => {
                    builder.push(" AND id = ").push_bind(key.as_str().to_string());
                }
                Condition::KeyIn(keys) if keys.is_empty() => {
                    builder.push(" AND 0");
                }
                Condition::KeyIn(keys) => {
                    builder.push(" AND id IN (");
                    let mut list = builder.separated(", ");
                    for key in keys {
                        list.push_bind(key.as_str().to_string());
                    }
                    list.push_unseparated(")");
                }
                Condition::Field { path, value } if path == KEY_FIELD => {
                    let key = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    builder.push(" AND id = ").push_bind(key);
                }
                Condition::Field { path, value } => {
                    builder
                        .push(" AND json_extract(body, ")
                        .push_bind(json_path(path))
                        .push(")");
                    push_comparison(builder, value);
                }
            }
        }
    }

    fn push_order(builder: &mut QueryBuilder<'_, Sqlite>, options: &QueryOptions) {
        if options.sort.is_empty() {
            builder.push(" ORDER BY rowid");
            return;
        }

        builder.push(" ORDER BY ");
        let mut terms = builder.separated(", ");
        for sort in &options.sort {
            if sort.field == KEY_FIELD {
                terms.push("id");
            } else {
                terms.push("json_extract(body, ");
                terms.push_bind_unseparated(json_path(&sort.field));
                terms.push_unseparated(")");
            }
            terms.push_unseparated(match sort.direction {
                SortDirection::Asc => " ASC",
                SortDirection::Desc => " DESC",
            });
        }
    }

    fn push_paging(builder: &mut QueryBuilder<'_, Sqlite>, options: &QueryOptions) {
        if options.limit.is_none() && options.offset.is_none() {
            return;
        }
        // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
        let limit = options
            .limit
            .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let offset = options
            .offset
            .map_or(0, |o| i64::try_from(o).unwrap_or(i64::MAX));
        builder
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
    }

    async fn insert_with<'e, E>(&self, executor: E, document: &StoredDocument) -> Result<(), sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO documents (namespace, id, body, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&self.namespace)
        .bind(document.key.as_str())
        .bind(document.persisted_body().to_string())
        .bind(&now)
        .bind(&now)
        .execute(executor)
        .await?;
        Ok(())
    }
}

fn json_path(field: &str) -> String {
    format!("$.{field}")
}

/// Equality against a JSON value as `json_extract` returns it.
fn push_comparison(builder: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        // json_extract yields NULL for both JSON null and a missing path.
        Value::Null => {
            builder.push(" IS NULL");
        }
        Value::Bool(b) => {
            builder.push(" = ").push_bind(i64::from(*b));
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                builder.push(" = ").push_bind(i);
            }
            None => {
                builder.push(" = ").push_bind(n.as_f64().unwrap_or_default());
            }
        },
        Value::String(s) => {
            builder.push(" = ").push_bind(s.clone());
        }
        Value::Array(_) | Value::Object(_) => {
            builder.push(" = json(").push_bind(value.to_string()).push(")");
        }
    }
}

fn parse_body(raw: &str) -> Result<Value, StoreError> {
    serde_json::from_str(raw).map_err(StoreError::from)
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn driver(&self) -> &'static str {
        "sqlite"
    }

    async fn insert_one(&self, document: StoredDocument) -> Result<(), StoreError> {
        self.insert_with(&self.pool, &document)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert_many(
        &self,
        documents: Vec<StoredDocument>,
        ordered: bool,
    ) -> Result<usize, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        let mut failures = Vec::new();
        let mut inserted = 0;

        for (index, document) in documents.iter().enumerate() {
            match self.insert_with(&mut *conn, document).await {
                Ok(()) => inserted += 1,
                Err(sqlx::Error::Database(db_err)) => {
                    failures.push(IndexedFailure::new(index, write_failure(db_err.as_ref())));
                    if ordered {
                        break;
                    }
                }
                Err(other) => return Err(map_sqlx_error(other)),
            }
        }

        if failures.is_empty() {
            Ok(inserted)
        } else {
            Err(StoreError::BulkWrite(BulkWriteFailure::new(failures)))
        }
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Value>, StoreError> {
        let mut builder = QueryBuilder::new("SELECT body FROM documents");
        self.push_where(&mut builder, filter);
        builder.push(" ORDER BY rowid LIMIT 1");

        let row: Option<String> = builder
            .build_query_scalar()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_deref().map(parse_body).transpose()
    }

    async fn find(&self, filter: &Filter, options: &QueryOptions) -> Result<Vec<Value>, StoreError> {
        let mut builder = QueryBuilder::new("SELECT body FROM documents");
        self.push_where(&mut builder, filter);
        Self::push_order(&mut builder, options);
        Self::push_paging(&mut builder, options);

        let rows: Vec<String> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|raw| {
                let body = parse_body(raw)?;
                Ok(match &options.projection {
                    Some(fields) => apply_projection(body, fields),
                    None => body,
                })
            })
            .collect()
    }

    async fn update_one(
        &self,
        filter: &Filter,
        document: StoredDocument,
        upsert: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let mut builder = QueryBuilder::new("SELECT id, body FROM documents");
        self.push_where(&mut builder, filter);
        builder.push(" ORDER BY rowid LIMIT 1");
        let target: Option<(String, String)> = builder
            .build_query_as()
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let outcome = match target {
            Some((id, raw)) => {
                let mut body = parse_body(&raw)?;
                let modified = apply_set(&mut body, document.body_without_key());
                if modified {
                    sqlx::query(
                        "UPDATE documents SET body = ?, updated_at = ? WHERE namespace = ? AND id = ?",
                    )
                    .bind(body.to_string())
                    .bind(Utc::now().to_rfc3339())
                    .bind(&self.namespace)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
                }
                UpdateOutcome {
                    matched: 1,
                    modified: u64::from(modified),
                    upserted: false,
                }
            }
            None if upsert => {
                self.insert_with(&mut *tx, &document)
                    .await
                    .map_err(map_sqlx_error)?;
                UpdateOutcome {
                    matched: 0,
                    modified: 0,
                    upserted: true,
                }
            }
            None => UpdateOutcome::default(),
        };

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(outcome)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("DELETE FROM documents WHERE namespace = ");
        builder.push_bind(self.namespace.clone());
        builder.push(" AND id IN (SELECT id FROM documents");
        self.push_where(&mut builder, filter);
        builder.push(" ORDER BY rowid LIMIT 1)");

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("DELETE FROM documents");
        self.push_where(&mut builder, filter);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn count_documents(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM documents");
        self.push_where(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn distinct(&self, field: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        // `->` returns the JSON text of the extracted value, so objects and
        // strings stay distinguishable.
        let mut builder = QueryBuilder::new("SELECT DISTINCT body -> ");
        builder.push_bind(json_path(field));
        builder.push(" FROM documents");
        self.push_where(&mut builder, filter);
        builder.push(" AND body -> ").push_bind(json_path(field)).push(" IS NOT NULL");

        let rows: Vec<String> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(String::as_str).map(parse_body).collect()
    }
}
