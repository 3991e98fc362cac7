use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::cli::commands::CommandContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{JsonDocument, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    /// Ordered insert; stop at the first rejected record
    Atomic,
    /// Unordered insert; report every rejected record
    Partial,
    /// Ordered insert without per-record attribution
    All,
}

#[derive(Args, Debug)]
pub struct InsertArgs {
    /// JSON file holding an array of objects
    pub file: PathBuf,

    /// Target collection
    #[arg(short = 'C', long)]
    pub collection: String,

    /// Write policy
    #[arg(short, long, value_enum, default_value_t = InsertMode::Partial)]
    pub mode: InsertMode,
}

#[derive(Debug, Serialize)]
pub struct InsertOutput {
    pub success: bool,
    pub mode: InsertMode,
    pub collection: String,
    pub attempted: usize,
    /// Keys of the records that were rejected.
    pub failed: Vec<String>,
    /// Keys known to be stored. `None` when the store did not say which
    /// records were written.
    pub inserted: Option<Vec<String>>,
    pub error: Option<String>,
}

impl CommandOutput for InsertOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if self.success {
            lines.push(format!(
                "Inserted {} record(s) into {}",
                self.attempted, self.collection
            ));
        } else {
            lines.push(format!(
                "{} of {} record(s) rejected by {}",
                self.failed.len(),
                self.attempted,
                self.collection
            ));
            for key in &self.failed {
                lines.push(format!("  - {key}"));
            }
            if let Some(ref error) = self.error {
                lines.push(format!("Error: {error}"));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Read a JSON array of objects. Objects without `_id` get a generated one.
pub fn read_records(path: &Path) -> Result<Vec<JsonDocument>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let values: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("{} must contain a JSON array", path.display()))?;

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            JsonDocument::with_generated_key(value)
                .with_context(|| format!("Invalid record at position {i}"))
        })
        .collect()
}

fn keys_of(records: &[JsonDocument]) -> Vec<String> {
    records.iter().map(|r| r.key().into_inner()).collect()
}

/// Keys of the batch outside the failed set. Duplicated keys in the batch
/// make the complement ambiguous, so none is reported then.
fn complement(batch: &[JsonDocument], failed: &[JsonDocument]) -> Option<Vec<String>> {
    let keys = keys_of(batch);
    let unique: HashSet<&String> = keys.iter().collect();
    if unique.len() != keys.len() {
        return None;
    }
    let failed: HashSet<String> = keys_of(failed).into_iter().collect();
    Some(keys.into_iter().filter(|k| !failed.contains(k)).collect())
}

pub async fn execute(args: InsertArgs, ctx: &CommandContext, json_mode: bool) -> Result<()> {
    let records = read_records(&args.file)?;
    let repo = ctx.repository(&args.collection).await?;
    let attempted = records.len();

    let mut result = InsertOutput {
        success: true,
        mode: args.mode,
        collection: args.collection.clone(),
        attempted,
        failed: Vec::new(),
        inserted: Some(keys_of(&records)),
        error: None,
    };

    match args.mode {
        InsertMode::Atomic => {
            if let Err(err) = repo.save_atomic(&records).await {
                result.success = false;
                // Everything before the rejected index was committed.
                result.inserted = err.index.map(|i| keys_of(&records[..i]));
                result.failed = err.record.iter().map(|r| r.key().into_inner()).collect();
                result.error = Some(err.to_string());
            }
        }
        InsertMode::Partial => {
            if let Err(err) = repo.save_partial_success(&records).await {
                result.success = false;
                result.inserted = if err.failed.is_empty() {
                    None
                } else {
                    complement(&records, &err.failed)
                };
                result.failed = keys_of(&err.failed);
                result.error = Some(err.to_string());
            }
        }
        InsertMode::All => {
            if let Err(err) = repo.save_all(&records).await {
                result.success = false;
                result.inserted = None;
                result.error = Some(err.to_string());
            }
        }
    }

    info!(
        collection = %args.collection,
        attempted,
        failed = result.failed.len(),
        success = result.success,
        "insert finished"
    );
    output(&result, json_mode);

    if result.success {
        Ok(())
    } else {
        anyhow::bail!("insert into {} did not fully succeed", args.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn doc(value: Value) -> JsonDocument {
        JsonDocument::try_from(value).unwrap()
    }

    #[test]
    fn test_read_records_generates_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"_id": "a", "n": 1}}, {{"n": 2}}]"#).unwrap();

        let records = read_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key().as_str(), "a");
        assert!(!records[1].key().as_str().is_empty());
    }

    #[test]
    fn test_read_records_rejects_non_objects() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        assert!(read_records(file.path()).is_err());
    }

    #[test]
    fn test_complement() {
        let batch = vec![doc(json!({"_id": "a"})), doc(json!({"_id": "b"})), doc(json!({"_id": "c"}))];
        let failed = vec![doc(json!({"_id": "b"}))];
        assert_eq!(complement(&batch, &failed), Some(vec!["a".to_string(), "c".to_string()]));

        let dup_batch = vec![doc(json!({"_id": "a"})), doc(json!({"_id": "a"}))];
        assert_eq!(complement(&dup_batch, &failed), None);
    }
}
