//! # Record Comparators
//!
//! A comparator turns a record pair into a comparison pattern: a single
//! integer summarizing per-field agreement. The pattern encoding belongs to
//! the comparator and must be deterministic for a fixed configuration.

use crate::error::ComparatorError;
use crate::record::{Field, Record, RecordSchema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Index of a comparison pattern in `0..pattern_count()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternIndex(pub u32);

impl fmt::Display for PatternIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl From<u32> for PatternIndex {
    fn from(value: u32) -> Self {
        PatternIndex(value)
    }
}

/// Maps a record pair to its comparison pattern.
///
/// Implementations are shared read-only across every tally and worker, so
/// `compare_index` must not keep per-call state.
pub trait RecordComparator: Send + Sync + fmt::Debug {
    fn compare_index(&self, record1: &Record, record2: &Record)
        -> Result<PatternIndex, ComparatorError>;

    /// Size of the pattern space. Every index returned by `compare_index` is
    /// below this bound.
    fn pattern_count(&self) -> u32;
}

/// Binary agree/disagree comparator.
///
/// Field `i` sets bit `i` of the pattern when both values are present and
/// equal. Records must come from the schema the comparator was built for.
#[derive(Debug, Clone)]
pub struct ExactComparator {
    schema: Arc<RecordSchema>,
}

impl ExactComparator {
    pub fn new(schema: Arc<RecordSchema>) -> Result<Self, ComparatorError> {
        if schema.n_fields() >= u32::BITS as usize {
            return Err(ComparatorError::TooManyFields {
                fields: schema.n_fields(),
            });
        }
        Ok(Self { schema })
    }

    /// Per-field agreement flags of a pattern produced by this comparator.
    pub fn agreements(&self, pattern: PatternIndex) -> Vec<bool> {
        (0..self.schema.n_fields())
            .map(|i| pattern.0 & (1 << i) != 0)
            .collect()
    }

    fn check_schema(&self, record: &Record) -> Result<(), ComparatorError> {
        if Arc::ptr_eq(record.schema(), &self.schema) {
            Ok(())
        } else {
            Err(ComparatorError::SchemaMismatch {
                expected: self.schema.name.clone(),
                found: record.schema().name.clone(),
            })
        }
    }
}

fn agrees(left: &Field, right: &Field) -> bool {
    !left.is_missing() && left == right
}

impl RecordComparator for ExactComparator {
    fn compare_index(
        &self,
        record1: &Record,
        record2: &Record,
    ) -> Result<PatternIndex, ComparatorError> {
        self.check_schema(record1)?;
        self.check_schema(record2)?;

        let pattern = record1
            .fields()
            .iter()
            .zip(record2.fields())
            .enumerate()
            .filter(|(_, (left, right))| agrees(left, right))
            .fold(0u32, |pattern, (i, _)| pattern | (1 << i));
        Ok(PatternIndex(pattern))
    }

    fn pattern_count(&self) -> u32 {
        1 << self.schema.n_fields()
    }
}
