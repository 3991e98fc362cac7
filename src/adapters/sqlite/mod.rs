//! SQLite driver: document storage in a single JSON table.

pub mod connection;
pub mod document_store;
pub mod migrations;

pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError, PoolConfig};
pub use document_store::SqliteDocumentStore;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};

use sqlx::error::DatabaseError as SqlxDatabaseError;
use sqlx::SqlitePool;

use crate::domain::errors::{StoreError, WriteFailure, WriteFailureKind};

#[derive(Debug, thiserror::Error)]
pub enum InitializeError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Open a pool for `database_url` and bring the schema up to date.
pub async fn initialize_database(
    database_url: &str,
    config: Option<PoolConfig>,
) -> Result<SqlitePool, InitializeError> {
    let pool = create_pool(database_url, config).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, InitializeError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Classify a constraint error reported for one document.
pub(crate) fn write_failure(err: &dyn SqlxDatabaseError) -> WriteFailure {
    let kind = if err.is_unique_violation() {
        WriteFailureKind::DuplicateKey
    } else {
        WriteFailureKind::Other
    };
    let failure = WriteFailure::new(kind, err.message());
    match err.code().and_then(|code| code.parse::<i32>().ok()) {
        Some(code) => failure.with_code(code),
        None => failure,
    }
}

/// Map a sqlx error onto the driver-neutral store error.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Write(write_failure(db_err.as_ref())),
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_) => StoreError::Unavailable(err.to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization(err.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(map_sqlx_error(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(map_sqlx_error(sqlx::Error::PoolClosed).is_unavailable());
        assert!(!map_sqlx_error(sqlx::Error::RowNotFound).is_unavailable());
    }

    #[tokio::test]
    async fn test_initialize_database_runs_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("docstore.db").display());

        let pool = initialize_database(&url, None).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
        pool.close().await;
    }
}
