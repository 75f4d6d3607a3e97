//! # Pattern Tallies
//!
//! [`IncrementalTally`] counts how often each comparison pattern occurs over
//! a stream of record pairs. [`Tally`] is an immutable snapshot of those
//! counts, handed to the downstream estimator while accumulation continues.
//! [`SharedTally`] lets several threads feed one accumulator.

use crate::bucket::SumBucket;
use crate::bucket_map::BucketMap;
use crate::comparator::{PatternIndex, RecordComparator};
use crate::error::ComparatorError;
use crate::record::Record;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

type PatternCounts = BTreeMap<PatternIndex, u64>;

/// Running pattern-index to count accumulator for one matching job.
#[derive(Debug, Clone)]
pub struct IncrementalTally {
    comparator: Arc<dyn RecordComparator>,
    counts: BucketMap<PatternIndex, u64, SumBucket, PatternCounts>,
}

impl IncrementalTally {
    pub fn new(comparator: Arc<dyn RecordComparator>) -> Self {
        Self {
            comparator,
            counts: BucketMap::ordered(SumBucket),
        }
    }

    /// Count one comparison of `record1` against `record2`.
    ///
    /// A comparator failure propagates unchanged and nothing is counted.
    pub fn add(
        &mut self,
        record1: &Record,
        record2: &Record,
    ) -> Result<PatternIndex, ComparatorError> {
        self.add_weighted(record1, record2, 1)
    }

    /// Count one comparison with an explicit weight.
    pub fn add_weighted(
        &mut self,
        record1: &Record,
        record2: &Record,
        weight: u64,
    ) -> Result<PatternIndex, ComparatorError> {
        let pattern = self.comparator.compare_index(record1, record2)?;
        self.add_pattern(pattern, weight);
        Ok(pattern)
    }

    /// Count a pattern that was already derived with this tally's comparator.
    #[inline]
    pub fn add_pattern(&mut self, pattern: PatternIndex, weight: u64) {
        debug_assert!(
            pattern.0 < self.comparator.pattern_count(),
            "pattern {pattern} outside comparator range"
        );
        self.counts.add(pattern, weight);
    }

    /// Snapshot the current counts. Later adds do not affect the snapshot.
    pub fn tally(&self) -> Tally {
        Tally {
            comparator: Arc::clone(&self.comparator),
            counts: self.counts.map().clone(),
        }
    }

    /// Fold a snapshot's counts into this accumulator.
    pub fn absorb(&mut self, tally: &Tally) {
        debug_assert!(
            Arc::ptr_eq(&self.comparator, &tally.comparator),
            "merging tallies built with different comparators"
        );
        for (&pattern, &count) in &tally.counts {
            self.counts.add(pattern, count);
        }
    }

    /// Key-wise sum of two accumulators. Associative and commutative.
    pub fn merge(mut self, other: IncrementalTally) -> IncrementalTally {
        debug_assert!(
            Arc::ptr_eq(&self.comparator, &other.comparator),
            "merging tallies built with different comparators"
        );
        if self.counts.len() < other.counts.len() {
            return other.merge(self);
        }
        for (pattern, count) in other.counts.into_map() {
            self.counts.add(pattern, count);
        }
        self
    }

    pub fn comparator(&self) -> &Arc<dyn RecordComparator> {
        &self.comparator
    }

    /// Total weight counted so far.
    pub fn pairs_counted(&self) -> u64 {
        self.counts.map().values().sum()
    }

    pub fn distinct_patterns(&self) -> usize {
        self.counts.len()
    }
}

/// Immutable snapshot of pattern counts plus the comparator that produced
/// them.
#[derive(Debug, Clone)]
pub struct Tally {
    comparator: Arc<dyn RecordComparator>,
    counts: PatternCounts,
}

impl Tally {
    /// Count for `pattern`; zero if never observed.
    pub fn count(&self, pattern: PatternIndex) -> u64 {
        self.counts.get(&pattern).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<PatternIndex, u64> {
        &self.counts
    }

    pub fn comparator(&self) -> &Arc<dyn RecordComparator> {
        &self.comparator
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct observed patterns.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatternIndex, u64)> + '_ {
        self.counts.iter().map(|(&pattern, &count)| (pattern, count))
    }

    /// Relative frequency of each observed pattern.
    pub fn frequencies(&self) -> Vec<(PatternIndex, f64)> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }
        self.iter()
            .map(|(pattern, count)| (pattern, count as f64 / total as f64))
            .collect()
    }

    /// Flat, serializable form of the counts.
    pub fn to_pattern_counts(&self) -> Vec<PatternCount> {
        self.iter()
            .map(|(pattern, count)| PatternCount { pattern, count })
            .collect()
    }
}

/// Snapshots are equal when they count the same patterns for the same
/// comparator instance.
impl PartialEq for Tally {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.comparator, &other.comparator) && self.counts == other.counts
    }
}

/// One row of an exported tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCount {
    pub pattern: PatternIndex,
    pub count: u64,
}

/// Tally fed concurrently from several threads.
///
/// Pattern derivation runs outside the lock; the count update and the
/// snapshot copy run under the same mutex, so every snapshot reflects a
/// prefix of the completed adds.
#[derive(Debug)]
pub struct SharedTally {
    comparator: Arc<dyn RecordComparator>,
    inner: Mutex<IncrementalTally>,
}

impl SharedTally {
    pub fn new(comparator: Arc<dyn RecordComparator>) -> Self {
        Self {
            inner: Mutex::new(IncrementalTally::new(Arc::clone(&comparator))),
            comparator,
        }
    }

    pub fn add(
        &self,
        record1: &Record,
        record2: &Record,
    ) -> Result<PatternIndex, ComparatorError> {
        let pattern = self.comparator.compare_index(record1, record2)?;
        self.inner.lock().add_pattern(pattern, 1);
        Ok(pattern)
    }

    pub fn absorb(&self, tally: &Tally) {
        self.inner.lock().absorb(tally);
    }

    pub fn tally(&self) -> Tally {
        self.inner.lock().tally()
    }

    pub fn into_inner(self) -> IncrementalTally {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, RecordSchema};
    use std::thread;

    /// Returns the pattern stored in the first field of `record1`.
    #[derive(Debug)]
    struct ScriptedComparator;

    impl RecordComparator for ScriptedComparator {
        fn compare_index(
            &self,
            record1: &Record,
            _record2: &Record,
        ) -> Result<PatternIndex, ComparatorError> {
            match record1.field(0) {
                Field::Integer(pattern) => Ok(PatternIndex(*pattern as u32)),
                other => Err(ComparatorError::Failed(format!("no pattern in {other}"))),
            }
        }

        fn pattern_count(&self) -> u32 {
            16
        }
    }

    fn scripted() -> Arc<dyn RecordComparator> {
        Arc::new(ScriptedComparator)
    }

    fn carrying(pattern: i64) -> Record {
        let schema = Arc::new(RecordSchema::new("scripted", vec!["pattern".into()], false));
        Record::new(schema, "K", "", "", vec![Field::Integer(pattern)]).unwrap()
    }

    fn tally_of(patterns: &[i64]) -> IncrementalTally {
        let mut tally = IncrementalTally::new(scripted());
        let other = carrying(0);
        for &pattern in patterns {
            tally.add(&carrying(pattern), &other).unwrap();
        }
        tally
    }

    #[test]
    fn test_counts_each_pattern() {
        let tally = tally_of(&[0, 2, 2, 5, 0, 0]).tally();

        let expected: BTreeMap<PatternIndex, u64> =
            [(PatternIndex(0), 3), (PatternIndex(2), 2), (PatternIndex(5), 1)]
                .into_iter()
                .collect();
        assert_eq!(tally.counts(), &expected);
        assert_eq!(tally.total(), 6);
        assert_eq!(tally.count(PatternIndex(7)), 0);
    }

    #[test]
    fn test_same_pair_twice() {
        let tally = tally_of(&[3, 3]).tally();
        assert_eq!(tally.count(PatternIndex(3)), 2);
        assert_eq!(tally.len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_adds() {
        let mut live = tally_of(&[1, 1]);
        let before = live.tally();
        live.add(&carrying(1), &carrying(0)).unwrap();
        live.add(&carrying(4), &carrying(0)).unwrap();

        assert_eq!(before.count(PatternIndex(1)), 2);
        assert_eq!(before.count(PatternIndex(4)), 0);
        let after = live.tally();
        assert_eq!(after.count(PatternIndex(1)), 3);
        assert_eq!(after.count(PatternIndex(4)), 1);
    }

    #[test]
    fn test_repeated_snapshots_are_equal() {
        let live = tally_of(&[9, 8, 9]);
        assert_eq!(live.tally(), live.tally());
    }

    #[test]
    fn test_comparator_failure_leaves_tally_unchanged() {
        let mut live = tally_of(&[2]);
        let schema = Arc::new(RecordSchema::new("scripted", vec!["pattern".into()], false));
        let bad = Record::new(schema, "K", "", "", vec![Field::text("oops")]).unwrap();

        let err = live.add(&bad, &carrying(0)).unwrap_err();
        assert!(matches!(err, ComparatorError::Failed(_)));
        assert_eq!(live.pairs_counted(), 1);
        assert_eq!(live.tally().count(PatternIndex(2)), 1);
    }

    #[test]
    fn test_weighted_add() {
        let mut live = IncrementalTally::new(scripted());
        live.add_weighted(&carrying(6), &carrying(0), 10).unwrap();
        live.add(&carrying(6), &carrying(0)).unwrap();
        assert_eq!(live.tally().count(PatternIndex(6)), 11);
    }

    #[test]
    fn test_merge_matches_single_tally() {
        let comparator = scripted();
        let left_patterns = [0i64, 1, 1, 7];
        let right_patterns = [1i64, 3, 0];

        let build = |patterns: &[i64]| {
            let mut tally = IncrementalTally::new(Arc::clone(&comparator));
            for &pattern in patterns {
                tally.add(&carrying(pattern), &carrying(0)).unwrap();
            }
            tally
        };

        let combined: Vec<i64> = left_patterns.iter().chain(&right_patterns).copied().collect();
        let single = build(&combined[..]).tally();

        let left_then_right = build(&left_patterns[..]).merge(build(&right_patterns[..])).tally();
        let right_then_left = build(&right_patterns[..]).merge(build(&left_patterns[..])).tally();
        assert_eq!(left_then_right, single);
        assert_eq!(right_then_left, single);
    }

    #[test]
    fn test_merge_is_associative() {
        let comparator = scripted();
        let build = |patterns: &[i64]| {
            let mut tally = IncrementalTally::new(Arc::clone(&comparator));
            for &pattern in patterns {
                tally.add(&carrying(pattern), &carrying(0)).unwrap();
            }
            tally
        };
        let (a, b, c) = (&[1i64, 2][..], &[2i64, 2, 3][..], &[4i64][..]);

        let left = build(a).merge(build(b)).merge(build(c)).tally();
        let right = build(a).merge(build(b).merge(build(c))).tally();
        assert_eq!(left, right);
        assert_eq!(left.total(), 6);
    }

    #[test]
    fn test_absorb_snapshot() {
        let comparator = scripted();
        let mut live = IncrementalTally::new(Arc::clone(&comparator));
        live.add(&carrying(5), &carrying(0)).unwrap();

        let mut other = IncrementalTally::new(Arc::clone(&comparator));
        other.add(&carrying(5), &carrying(0)).unwrap();
        other.add(&carrying(1), &carrying(0)).unwrap();

        live.absorb(&other.tally());
        let snapshot = live.tally();
        assert_eq!(snapshot.count(PatternIndex(5)), 2);
        assert_eq!(snapshot.count(PatternIndex(1)), 1);
        assert_eq!(live.distinct_patterns(), 2);
    }

    #[test]
    fn test_frequencies_and_export() {
        let tally = tally_of(&[0, 0, 0, 4]).tally();
        assert_eq!(
            tally.frequencies(),
            vec![(PatternIndex(0), 0.75), (PatternIndex(4), 0.25)]
        );
        assert_eq!(
            tally.to_pattern_counts(),
            vec![
                PatternCount {
                    pattern: PatternIndex(0),
                    count: 3
                },
                PatternCount {
                    pattern: PatternIndex(4),
                    count: 1
                },
            ]
        );
        assert!(IncrementalTally::new(scripted()).tally().frequencies().is_empty());
    }

    #[test]
    fn test_shared_tally_concurrent_adds() {
        let shared = Arc::new(SharedTally::new(scripted()));
        let mut handles = vec![];

        for t in 0..8i64 {
            let shared = Arc::clone(&shared);
            handles.push(thread::spawn(move || {
                let other = carrying(0);
                for i in 0..500i64 {
                    shared.add(&carrying((t + i) % 4), &other).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let tally = shared.tally();
        assert_eq!(tally.total(), 4000);
        for pattern in 0..4u32 {
            assert_eq!(tally.count(PatternIndex(pattern)), 1000);
        }
    }

    #[test]
    fn test_shared_tally_snapshots_never_overcount() {
        let shared = Arc::new(SharedTally::new(scripted()));
        let writer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..2000 {
                    shared.add(&carrying(1), &carrying(0)).unwrap();
                }
            })
        };

        let mut last = 0;
        for _ in 0..50 {
            let seen = shared.tally().count(PatternIndex(1));
            assert!(seen >= last);
            assert!(seen <= 2000);
            last = seen;
        }
        writer.join().unwrap();

        assert_eq!(Arc::try_unwrap(shared).unwrap().into_inner().pairs_counted(), 2000);
    }
}
