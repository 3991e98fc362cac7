//! Schema versioning for the document table.
//!
//! Migrations are embedded in the binary and applied in version order. Each
//! one runs in its own transaction together with the row that records it, so
//! a failed migration leaves the recorded version unchanged.

use sqlx::{Executor, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to execute migration {version}: {source}")]
    ExecutionError {
        version: i64,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to get schema version: {0}")]
    VersionCheckError(#[source] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sql: &'static str,
}

pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply every migration newer than the recorded schema version and
    /// return how many ran.
    pub async fn run_embedded_migrations(
        &self,
        migrations: Vec<Migration>,
    ) -> Result<usize, MigrationError> {
        self.ensure_version_table().await?;
        let current = self.get_current_version().await?;

        let mut pending: Vec<_> = migrations
            .into_iter()
            .filter(|m| m.version > current)
            .collect();
        pending.sort_by_key(|m| m.version);

        for migration in &pending {
            self.apply(migration).await?;
            debug!(version = migration.version, description = migration.description, "migration applied");
        }
        if !pending.is_empty() {
            info!(from = current, applied = pending.len(), "document schema upgraded");
        }
        Ok(pending.len())
    }

    pub async fn get_current_version(&self) -> Result<i64, MigrationError> {
        let (version,): (i64,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await
                .map_err(MigrationError::VersionCheckError)?;
        Ok(version)
    }

    async fn ensure_version_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|source| MigrationError::ExecutionError { version: 0, source })?;
        Ok(())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), MigrationError> {
        let version = migration.version;
        let failed = |source: sqlx::Error| MigrationError::ExecutionError { version, source };

        let mut tx = self.pool.begin().await.map_err(failed)?;
        tx.execute(sqlx::raw_sql(migration.sql))
            .await
            .map_err(failed)?;
        tx.execute(
            sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
                .bind(version)
                .bind(migration.description),
        )
        .await
        .map_err(failed)?;
        tx.commit().await.map_err(failed)
    }
}

pub fn all_embedded_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "documents table",
        sql: include_str!("../../../migrations/001_documents.sql"),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_test_pool;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_test_pool().await.unwrap();
        let migrator = Migrator::new(pool.clone());

        assert_eq!(migrator.run_embedded_migrations(all_embedded_migrations()).await.unwrap(), 1);
        assert_eq!(migrator.run_embedded_migrations(all_embedded_migrations()).await.unwrap(), 0);
        assert_eq!(migrator.get_current_version().await.unwrap(), 1);

        let (tables,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='documents'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 1);
    }

    #[tokio::test]
    async fn test_failed_migration_is_not_recorded() {
        let pool = create_test_pool().await.unwrap();
        let migrator = Migrator::new(pool);
        let broken = Migration {
            version: 7,
            description: "broken",
            sql: "CREATE TABLE oops (",
        };

        let err = migrator.run_embedded_migrations(vec![broken]).await.unwrap_err();
        assert!(matches!(err, MigrationError::ExecutionError { version: 7, .. }));
        assert_eq!(migrator.get_current_version().await.unwrap(), 0);
    }
}
