use std::collections::BTreeSet;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::commands::{build_filter, parse_where, CommandContext};
use crate::cli::output::{cell_value, list_table, output, truncate, CommandOutput};
use crate::domain::models::{QueryOptions, SortOption, KEY_FIELD};

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Collection to query
    #[arg(short = 'C', long)]
    pub collection: String,

    /// Only the record with this key
    #[arg(long)]
    pub id: Option<String>,

    /// Equality condition, repeatable (field=value)
    #[arg(short = 'w', long = "where", value_parser = parse_where)]
    pub conditions: Vec<(String, Value)>,

    /// Sort key, repeatable (field or field:desc)
    #[arg(short, long)]
    pub sort: Vec<SortOption>,

    /// Fields to return, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Maximum number of records
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// Records to skip
    #[arg(long)]
    pub skip: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct FindOutput {
    pub collection: String,
    pub records: Vec<Map<String, Value>>,
    /// Matches before limit and skip were applied.
    pub total: u64,
}

impl CommandOutput for FindOutput {
    fn to_human(&self) -> String {
        if self.records.is_empty() {
            return format!("No records found in {}.", self.collection);
        }

        // `_id` first, then every other field seen, alphabetically.
        let mut columns: Vec<&str> = vec![KEY_FIELD];
        let others: BTreeSet<&str> = self
            .records
            .iter()
            .flat_map(|r| r.keys().map(String::as_str))
            .filter(|k| *k != KEY_FIELD)
            .collect();
        columns.extend(others);

        let mut table = list_table(&columns);
        for record in &self.records {
            table.add_row(columns.iter().map(|c| {
                record
                    .get(*c)
                    .map(|v| truncate(&cell_value(v), 40))
                    .unwrap_or_default()
            }));
        }

        format!(
            "Showing {} of {} record(s) in {}:\n{table}",
            self.records.len(),
            self.total,
            self.collection
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: FindArgs, ctx: &CommandContext, json_mode: bool) -> Result<()> {
    let repo = ctx.repository(&args.collection).await?;
    let filter = build_filter(args.id.as_deref(), &args.conditions);

    let mut options = QueryOptions {
        sort: args.sort,
        limit: args.limit,
        offset: args.skip,
        ..QueryOptions::default()
    };
    if !args.fields.is_empty() {
        options = options.project(args.fields);
    }

    let page = repo.find_paginated(&filter, &options).await?;
    let records = page.items.into_iter().map(|doc| doc.fields().clone()).collect();

    output(
        &FindOutput {
            collection: args.collection,
            records,
            total: page.total,
        },
        json_mode,
    );
    Ok(())
}
