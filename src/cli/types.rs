//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::commands::count::CountArgs;
use crate::cli::commands::delete::DeleteArgs;
use crate::cli::commands::find::FindArgs;
use crate::cli::commands::insert::InsertArgs;

#[derive(Parser, Debug)]
#[command(name = "docstore")]
#[command(about = "docstore - document repository over SQL and NoSQL drivers", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file to load instead of docstore.yaml and .docstore/local.yaml
    #[arg(short, long, global = true, env = "DOCSTORE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the configured database and ping it
    Ping,

    /// Bulk-insert records from a JSON file
    Insert(InsertArgs),

    /// Query records in a collection
    Find(FindArgs),

    /// Count records in a collection
    Count(CountArgs),

    /// Delete records from a collection
    Delete(DeleteArgs),
}
