//! Database selection and the shared connection.

pub mod connection;
pub mod handle;
pub mod kind;

pub use connection::{connect, redact_uri, Connection, ConnectionError};
pub use handle::DatabaseHandle;
pub use kind::DatabaseKind;
