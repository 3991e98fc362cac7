//! Port trait definitions (Hexagonal Architecture)
//!
//! - `DocumentStore`: one collection of a document database, implemented by
//!   the SQLite, MongoDB and in-memory adapters.
//!
//! The repository service is written only against these traits, so drivers
//! can be swapped without touching it.

pub mod document_store;

pub use document_store::{DocumentStore, UpdateOutcome};
