//! In-memory document store, used for development and tests.

pub mod document_store;

pub use document_store::{InMemoryDatabase, InMemoryDocumentStore};
