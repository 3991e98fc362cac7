//! Domain errors for the docstore repository layer.
//!
//! Two levels exist:
//! - [`StoreError`]: what a driver reports back through the
//!   [`DocumentStore`](crate::domain::ports::DocumentStore) port.
//! - [`DatabaseError`]: what the repository surfaces to callers, always
//!   tagged with the name of the operation that failed.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Classification of a single failed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailureKind {
    /// The identifying key collided with an existing document.
    DuplicateKey,
    /// Any other per-document rejection.
    Other,
}

impl fmt::Display for WriteFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey => write!(f, "duplicate key"),
            Self::Other => write!(f, "write rejected"),
        }
    }
}

/// A single document rejected by the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct WriteFailure {
    /// Driver-specific error code, when the driver has one.
    pub code: Option<i32>,
    pub kind: WriteFailureKind,
    pub message: String,
}

impl WriteFailure {
    pub fn new(kind: WriteFailureKind, message: impl Into<String>) -> Self {
        Self {
            code: None,
            kind,
            message: message.into(),
        }
    }

    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::new(WriteFailureKind::DuplicateKey, message)
    }

    #[must_use]
    pub const fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self.kind, WriteFailureKind::DuplicateKey)
    }
}

/// A write failure attributed to a position in the submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFailure {
    pub index: usize,
    pub cause: WriteFailure,
}

impl IndexedFailure {
    pub const fn new(index: usize, cause: WriteFailure) -> Self {
        Self { index, cause }
    }
}

/// Structured outcome of a bulk insert that did not fully succeed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkWriteFailure {
    /// Per-index failures in the order the driver reported them.
    pub failures: Vec<IndexedFailure>,
    /// Write concern error, if the driver reported one.
    pub write_concern: Option<String>,
}

impl BulkWriteFailure {
    pub const fn new(failures: Vec<IndexedFailure>) -> Self {
        Self {
            failures,
            write_concern: None,
        }
    }
}

impl fmt::Display for BulkWriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bulk write failed for {} document(s)", self.failures.len())?;
        if let Some(first) = self.failures.first() {
            write!(f, " (first at index {}: {})", first.index, first.cause)?;
        }
        if let Some(ref wc) = self.write_concern {
            write!(f, "; write concern error: {wc}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BulkWriteFailure {}

/// Errors reported by a document store driver.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Some documents of a bulk insert were rejected.
    #[error(transparent)]
    BulkWrite(BulkWriteFailure),

    /// A single-document write was rejected.
    #[error("write failed: {0}")]
    Write(WriteFailure),

    /// The store could not be reached.
    #[error("store unreachable: {0}")]
    Unavailable(String),

    /// The call did not complete before its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A document could not be converted to or from the driver format.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Anything else the driver reported.
    #[error("driver error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Connectivity failures and deadlines, i.e. nothing the caller sent was
    /// at fault.
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// What went wrong in a repository operation.
#[derive(Debug, Error)]
pub enum DatabaseErrorKind {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("partial insert failure: {failed} of {attempted} documents failed")]
    PartialWriteFailure { failed: usize, attempted: usize },

    #[error("insert failed at index {index}: {cause}")]
    FirstWriteFailure {
        index: usize,
        #[source]
        cause: WriteFailure,
    },

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for DatabaseErrorKind {
    fn from(err: StoreError) -> Self {
        if err.is_unavailable() {
            Self::StoreUnavailable(err)
        } else {
            Self::Store(err)
        }
    }
}

/// A repository failure tagged with the operation that produced it.
#[derive(Debug, Error)]
#[error("operation {operation} failed: {kind}")]
pub struct DatabaseError {
    pub operation: String,
    pub kind: DatabaseErrorKind,
}

impl DatabaseError {
    pub fn new(operation: impl Into<String>, kind: impl Into<DatabaseErrorKind>) -> Self {
        Self {
            operation: operation.into(),
            kind: kind.into(),
        }
    }

    pub fn invalid_argument(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(operation, DatabaseErrorKind::InvalidArgument(message.into()))
    }

    pub fn not_found(operation: impl Into<String>, what: impl Into<String>) -> Self {
        Self::new(operation, DatabaseErrorKind::NotFound(what.into()))
    }

    pub const fn kind(&self) -> &DatabaseErrorKind {
        &self.kind
    }

    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::InvalidArgument(_))
    }

    pub const fn is_unavailable(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::StoreUnavailable(_))
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::NotFound(_))
    }

    /// True for a key collision, whether from a single or a bulk insert.
    pub const fn is_duplicate_key(&self) -> bool {
        match &self.kind {
            DatabaseErrorKind::FirstWriteFailure { cause, .. }
            | DatabaseErrorKind::Store(StoreError::Write(cause)) => cause.is_duplicate_key(),
            _ => false,
        }
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
