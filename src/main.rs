//! docstore CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use docstore::cli::commands::{self, CommandContext};
use docstore::cli::{Cli, Commands};
use docstore::infrastructure::config::ConfigLoader;
use docstore::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        docstore::cli::handle_error(&err, json_mode);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let log_config = LogConfig::from_settings(&config.logging)
        .map_err(anyhow::Error::msg)
        .context("Invalid logging configuration")?;
    // Dropping the logger flushes the file writer, so it lives until exit.
    let _logger = LoggerImpl::init(&log_config)?;

    let ctx = CommandContext::new(config);
    let result = match cli.command {
        Commands::Ping => commands::ping::execute(&ctx, cli.json).await,
        Commands::Insert(args) => commands::insert::execute(args, &ctx, cli.json).await,
        Commands::Find(args) => commands::find::execute(args, &ctx, cli.json).await,
        Commands::Count(args) => commands::count::execute(args, &ctx, cli.json).await,
        Commands::Delete(args) => commands::delete::execute(args, &ctx, cli.json).await,
    };

    ctx.close().await;
    result
}
