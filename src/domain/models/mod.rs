pub mod config;
pub mod json_document;
pub mod query;
pub mod record;

pub use config::{Config, DatabaseConfig, LoggingConfig};
pub use json_document::{JsonDocument, JsonDocumentError};
pub use query::{Condition, Filter, Page, QueryOptions, SortDirection, SortOption};
pub use record::{Record, RecordKey, StoredDocument, KEY_FIELD};
