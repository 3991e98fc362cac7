//! Bulk-insert result partitioning.
//!
//! A bulk insert reports failures as positions in the submitted batch. The
//! functions here map those positions back to the caller's records under the
//! two write policies the repository offers:
//!
//! - **atomic** (ordered insert): the store halts at the first rejection, so
//!   at most one record is reported and everything before it is committed.
//!   When a driver lists several failures, the lowest index is reported,
//!   not the first one in the driver's list.
//! - **partial success** (unordered insert): every record is attempted and
//!   exactly the rejected ones are reported.
//!
//! Successful records are never returned; callers that need them take the
//! complement of the failed set.

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::errors::{
    BulkWriteFailure, DatabaseError, DatabaseErrorKind, IndexedFailure, StoreError,
};

pub(crate) const SAVE_ATOMIC: &str = "save_atomic";
pub(crate) const SAVE_PARTIAL_SUCCESS: &str = "save_partial_success";

/// Failure of an atomic (ordered) bulk save.
#[derive(Debug)]
pub struct AtomicSaveError<T> {
    /// Batch position of the rejected record, when the store attributed one.
    pub index: Option<usize>,
    /// The rejected record. `None` when the failure could not be attributed,
    /// e.g. the store was unreachable.
    pub record: Option<T>,
    pub error: DatabaseError,
}

impl<T> AtomicSaveError<T> {
    pub(crate) const fn unattributed(error: DatabaseError) -> Self {
        Self {
            index: None,
            record: None,
            error,
        }
    }
}

impl<T> fmt::Display for AtomicSaveError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T: fmt::Debug> std::error::Error for AtomicSaveError<T> {}

/// Failure of a partial-success (unordered) bulk save.
#[derive(Debug)]
pub struct PartialSaveError<T> {
    /// Rejected records in batch order. Empty when the failure could not be
    /// attributed to any position.
    pub failed: Vec<T>,
    pub error: DatabaseError,
}

impl<T> PartialSaveError<T> {
    pub(crate) const fn unattributed(error: DatabaseError) -> Self {
        Self {
            failed: Vec::new(),
            error,
        }
    }
}

impl<T> fmt::Display for PartialSaveError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T: fmt::Debug> std::error::Error for PartialSaveError<T> {}

/// The lowest-indexed failure that falls inside the batch.
///
/// Drivers normally report failures in index order, but the minimum is taken
/// so the result never depends on report order.
pub fn first_failure(failure: &BulkWriteFailure, batch_len: usize) -> Option<&IndexedFailure> {
    failure
        .failures
        .iter()
        .filter(|f| f.index < batch_len)
        .min_by_key(|f| f.index)
}

/// Every reported failing position, deduplicated.
pub fn failed_indices(failure: &BulkWriteFailure) -> BTreeSet<usize> {
    failure.failures.iter().map(|f| f.index).collect()
}

/// The records at the reported failing positions, in batch order.
pub fn partition_failed<T: Clone>(batch: &[T], failure: &BulkWriteFailure) -> Vec<T> {
    let failed = failed_indices(failure);
    batch
        .iter()
        .enumerate()
        .filter(|(idx, _)| failed.contains(idx))
        .map(|(_, record)| record.clone())
        .collect()
}

/// Translate the outcome of an ordered `insert_many` into the atomic result.
pub(crate) fn attribute_atomic<T: Clone>(
    batch: &[T],
    outcome: Result<usize, StoreError>,
) -> Result<(), AtomicSaveError<T>> {
    let failure = match outcome {
        Ok(_) => return Ok(()),
        Err(StoreError::BulkWrite(failure)) => failure,
        Err(other) => {
            return Err(AtomicSaveError::unattributed(DatabaseError::new(
                SAVE_ATOMIC,
                other,
            )))
        }
    };

    match first_failure(&failure, batch.len()) {
        Some(first) => Err(AtomicSaveError {
            index: Some(first.index),
            record: Some(batch[first.index].clone()),
            error: DatabaseError::new(
                SAVE_ATOMIC,
                DatabaseErrorKind::FirstWriteFailure {
                    index: first.index,
                    cause: first.cause.clone(),
                },
            ),
        }),
        // Nothing attributable, e.g. only a write concern error.
        None => Err(AtomicSaveError::unattributed(DatabaseError::new(
            SAVE_ATOMIC,
            StoreError::BulkWrite(failure),
        ))),
    }
}

/// Translate the outcome of an unordered `insert_many` into the
/// partial-success result.
pub(crate) fn attribute_partial<T: Clone>(
    batch: &[T],
    outcome: Result<usize, StoreError>,
) -> Result<(), PartialSaveError<T>> {
    let failure = match outcome {
        Ok(_) => return Ok(()),
        Err(StoreError::BulkWrite(failure)) => failure,
        Err(other) => {
            return Err(PartialSaveError::unattributed(DatabaseError::new(
                SAVE_PARTIAL_SUCCESS,
                other,
            )))
        }
    };

    let failed = partition_failed(batch, &failure);
    if failed.is_empty() {
        return Err(PartialSaveError::unattributed(DatabaseError::new(
            SAVE_PARTIAL_SUCCESS,
            StoreError::BulkWrite(failure),
        )));
    }

    let error = DatabaseError::new(
        SAVE_PARTIAL_SUCCESS,
        DatabaseErrorKind::PartialWriteFailure {
            failed: failed.len(),
            attempted: batch.len(),
        },
    );
    Err(PartialSaveError { failed, error })
}
