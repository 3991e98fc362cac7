use std::sync::Arc;

use docstore::adapters::sqlite::{create_migrated_test_pool, SqliteDocumentStore};
use docstore::{Record, Repository};
use sqlx::SqlitePool;

/// Create an in-memory SQLite database for testing
///
/// Each call creates a completely isolated database with the documents
/// schema applied.
pub async fn setup_test_db() -> SqlitePool {
    create_migrated_test_pool()
        .await
        .expect("failed to create test database")
}

/// Repository over `collection` of database `test` in `pool`.
pub fn sqlite_repository<T: Record>(pool: &SqlitePool, collection: &str) -> Repository<T> {
    Repository::new(Arc::new(SqliteDocumentStore::new(
        pool.clone(),
        "test",
        collection,
    )))
}

/// Teardown test database
///
/// Closes the connection pool and cleans up resources.
pub async fn teardown_test_db(pool: SqlitePool) {
    pool.close().await;
}
