//! Driver adapters implementing the DocumentStore port.

pub mod memory;
pub mod mongo;
pub mod sqlite;
