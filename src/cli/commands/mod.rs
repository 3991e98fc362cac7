//! Subcommand implementations.

pub mod count;
pub mod delete;
pub mod find;
pub mod insert;
pub mod ping;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::domain::models::{Config, Filter, JsonDocument};
use crate::infrastructure::database::{Connection, DatabaseHandle};
use crate::services::Repository;

/// What every subcommand needs: the loaded config and the shared connection.
pub struct CommandContext {
    pub config: Config,
    handle: DatabaseHandle,
}

impl CommandContext {
    pub fn new(config: Config) -> Self {
        let handle = DatabaseHandle::new(config.database.clone());
        Self { config, handle }
    }

    pub async fn connection(&self) -> Result<&Connection> {
        self.handle
            .get()
            .await
            .context("Failed to connect to the configured database")
    }

    /// Schemaless repository over `collection` in the configured database.
    pub async fn repository(&self, collection: &str) -> Result<Repository<JsonDocument>> {
        let conn = self.connection().await?;
        Ok(conn
            .repository(&self.config.database.name, collection)
            .await?)
    }

    pub async fn close(&self) {
        if let Ok(conn) = self.handle.get().await {
            conn.close().await;
        }
    }
}

/// Parse `field=value`. The value is read as JSON when it parses, otherwise
/// as a plain string, so `age=30` matches a number and `name=ann` a string.
pub fn parse_where(raw: &str) -> Result<(String, Value), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got `{raw}`"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((field.to_string(), value))
}

/// Conjunction of an optional key and `field=value` conditions.
pub fn build_filter(id: Option<&str>, conditions: &[(String, Value)]) -> Filter {
    let base = id.map_or_else(Filter::all, Filter::by_key);
    conditions
        .iter()
        .fold(base, |filter, (field, value)| filter.eq(field.clone(), value.clone()))
}
