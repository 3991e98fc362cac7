use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use crate::cli::commands::{build_filter, parse_where, CommandContext};
use crate::cli::output::{output, CommandOutput};

#[derive(Args, Debug)]
pub struct CountArgs {
    /// Collection to count
    #[arg(short = 'C', long)]
    pub collection: String,

    /// Equality condition, repeatable (field=value)
    #[arg(short = 'w', long = "where", value_parser = parse_where)]
    pub conditions: Vec<(String, Value)>,
}

#[derive(Debug, Serialize)]
pub struct CountOutput {
    pub collection: String,
    pub count: u64,
}

impl CommandOutput for CountOutput {
    fn to_human(&self) -> String {
        format!("{} record(s) in {}", self.count, self.collection)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: CountArgs, ctx: &CommandContext, json_mode: bool) -> Result<()> {
    let repo = ctx.repository(&args.collection).await?;
    let filter = build_filter(None, &args.conditions);
    let count = repo.count_by_filter(&filter).await?;

    output(
        &CountOutput {
            collection: args.collection,
            count,
        },
        json_mode,
    );
    Ok(())
}
