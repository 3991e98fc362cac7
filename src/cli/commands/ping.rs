use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::commands::CommandContext;
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::database::redact_uri;

#[derive(Debug, Serialize)]
pub struct PingOutput {
    pub success: bool,
    pub kind: String,
    pub uri: String,
    pub database: String,
    pub latency_ms: u128,
}

impl CommandOutput for PingOutput {
    fn to_human(&self) -> String {
        format!(
            "{} database `{}` at {} answered in {} ms",
            self.kind, self.database, self.uri, self.latency_ms
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(ctx: &CommandContext, json_mode: bool) -> Result<()> {
    let database = &ctx.config.database;
    let started = Instant::now();

    let conn = ctx.connection().await?;
    conn.ping(&database.name)
        .await
        .context("Database did not answer the ping")?;

    output(
        &PingOutput {
            success: true,
            kind: conn.kind().to_string(),
            uri: redact_uri(&database.uri),
            database: database.name.clone(),
            latency_ms: started.elapsed().as_millis(),
        },
        json_mode,
    );
    Ok(())
}
