//! # Errors
//!
//! Typed failures for each stage of a linkage pass. Record sources fail with
//! [`IterationError`], comparators with [`ComparatorError`], record
//! construction with [`RecordError`]. The pipeline folds the first two into
//! [`LinkageError`].

use thiserror::Error;

/// The record source could not produce the next record.
#[derive(Debug, Error)]
pub enum IterationError {
    #[error("record source I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record at position {position}: {reason}")]
    Malformed { position: usize, reason: String },
    #[error("record source failed: {0}")]
    Source(String),
}

/// The comparator could not compute a pattern index for a pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComparatorError {
    #[error("record schema `{found}` is not the schema instance `{expected}` the comparator was built for")]
    SchemaMismatch { expected: String, found: String },
    #[error("{fields} fields cannot be encoded in a 32-bit pattern index")]
    TooManyFields { fields: usize },
    #[error("comparison failed: {0}")]
    Failed(String),
}

/// A record did not match the schema it was built against.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("schema `{schema}` expects {expected} fields, got {found}")]
    Arity {
        schema: String,
        expected: usize,
        found: usize,
    },
    #[error("blocking field {index} is out of range for {fields} fields")]
    BlockingField { index: usize, fields: usize },
}

/// Failure of a full block-and-tally pass.
#[derive(Debug, Error)]
pub enum LinkageError {
    #[error(transparent)]
    Iteration(#[from] IterationError),
    #[error(transparent)]
    Comparator(#[from] ComparatorError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
