//! docstore - generic document repository
//!
//! A typed repository over a collection of JSON documents, with drivers for
//! SQLite (`sql`), MongoDB (`nosql`) and an in-process store (`memory`).
//! Bulk inserts come in two flavours: all-or-nothing (`save_atomic`) and
//! best-effort (`save_partial_success`), both reporting exactly which records
//! failed.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): records, filters, the driver port and errors
//! - **Adapter Layer** (`adapters`): SQLite, MongoDB and in-memory drivers
//! - **Service Layer** (`services`): the generic repository and bulk insert
//! - **Infrastructure Layer** (`infrastructure`): config, connection, logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use docstore::{connect, DatabaseConfig, JsonDocument};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let conn = connect(&DatabaseConfig::default()).await?;
//!     let products = conn.repository::<JsonDocument>("shop", "products").await?;
//!     println!("{} products", products.count().await?);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DatabaseError, DatabaseErrorKind, DatabaseResult, StoreError};
pub use domain::models::{
    Config, DatabaseConfig, Filter, JsonDocument, LoggingConfig, Page, QueryOptions, Record,
    RecordKey, SortDirection, SortOption,
};
pub use domain::ports::DocumentStore;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::database::{connect, Connection, DatabaseHandle, DatabaseKind};
pub use services::{AtomicSaveError, PartialSaveError, Repository};
