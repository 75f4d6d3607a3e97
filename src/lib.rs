//! # linktally
//!
//! Blocking and comparison-pattern tallying for probabilistic record linkage.
//!
//! Records are partitioned into blocks by a cheap blocking key, pairs inside
//! each block are compared into an integer comparison pattern, and pattern
//! frequencies are accumulated into a [`Tally`]: the sufficient statistic for
//! a Fellegi–Sunter style match/non-match estimator.
//!
//! ```
//! use std::sync::Arc;
//! use linktally::{infallible, ExactComparator, Field, Linkage, PatternIndex, Record, RecordSchema, TallyTuning};
//!
//! let schema = Arc::new(
//!     RecordSchema::new("person", vec!["surname".into(), "given".into()], false)
//!         .with_blocking_fields(vec![0])
//!         .unwrap(),
//! );
//! let records = vec![
//!     Record::keyed(schema.clone(), "1", "", vec!["SMITH".into(), "ANN".into()]).unwrap(),
//!     Record::keyed(schema.clone(), "2", "", vec!["SMITH".into(), "ANN".into()]).unwrap(),
//!     Record::keyed(schema.clone(), "3", "", vec!["JONES".into(), Field::Missing]).unwrap(),
//! ];
//!
//! let comparator = Arc::new(ExactComparator::new(schema).unwrap());
//! let outcome = Linkage::new(comparator, TallyTuning::sequential())
//!     .run(infallible(records))
//!     .unwrap();
//! assert_eq!(outcome.tally.count(PatternIndex(0b11)), 1);
//! ```

pub mod blocking;
pub mod bucket;
pub mod bucket_map;
pub mod comparator;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod tally;

// Re-export main types for convenience
pub use blocking::{block, block_records, unordered_pairs, BlockSummary, Blocks};
pub use bucket::{Bucket, ListBucket, OccurrenceBucket, SumBucket};
pub use bucket_map::{BucketMap, BucketStore};
pub use comparator::{ExactComparator, PatternIndex, RecordComparator};
pub use config::{LinkageConfig, PairErrorPolicy, Profile, TallyTuning};
pub use error::{ComparatorError, IterationError, LinkageError, RecordError};
pub use pipeline::{Linkage, TallyOutcome};
pub use record::{Field, Record, RecordSchema};
pub use source::{infallible, RecordSource};
pub use tally::{IncrementalTally, PatternCount, SharedTally, Tally};
