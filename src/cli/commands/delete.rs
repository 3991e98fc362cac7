use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::commands::CommandContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::RecordKey;

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("target").required(true).args(["id", "all"]))]
pub struct DeleteArgs {
    /// Collection to delete from
    #[arg(short = 'C', long)]
    pub collection: String,

    /// Delete the record with this key
    #[arg(long)]
    pub id: Option<String>,

    /// Delete every record in the collection
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteOutput {
    pub success: bool,
    pub collection: String,
    pub deleted: u64,
}

impl CommandOutput for DeleteOutput {
    fn to_human(&self) -> String {
        format!("Deleted {} record(s) from {}", self.deleted, self.collection)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: DeleteArgs, ctx: &CommandContext, json_mode: bool) -> Result<()> {
    let repo = ctx.repository(&args.collection).await?;

    let deleted = match args.id {
        Some(id) => {
            repo.delete(&RecordKey::new(id)).await?;
            1
        }
        None => repo.delete_all().await?,
    };

    output(
        &DeleteOutput {
            success: true,
            collection: args.collection,
            deleted,
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cli::types::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_delete_requires_a_target() {
        assert!(Cli::try_parse_from(["docstore", "delete", "-C", "items"]).is_err());
        assert!(
            Cli::try_parse_from(["docstore", "delete", "-C", "items", "--id", "1", "--all"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["docstore", "delete", "-C", "items", "--all"]).unwrap();
        let Commands::Delete(args) = cli.command else {
            panic!("expected delete");
        };
        assert!(args.all);
        assert!(args.id.is_none());
    }
}
