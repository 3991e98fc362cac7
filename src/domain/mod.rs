//! Domain layer for the docstore repository
//!
//! Records, filters, the driver port and the error taxonomy. Nothing in here
//! talks to a database.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{
    BulkWriteFailure, DatabaseError, DatabaseErrorKind, DatabaseResult, IndexedFailure,
    StoreError, WriteFailure, WriteFailureKind,
};
