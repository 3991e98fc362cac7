//! Repository services built on the DocumentStore port.

pub mod bulk_insert;
pub mod repository;

pub use bulk_insert::{AtomicSaveError, PartialSaveError};
pub use repository::Repository;
