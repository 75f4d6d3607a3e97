//! # Blocking
//!
//! Partitions a record stream into blocks sharing a blocking key, so that
//! pairwise comparison only happens inside a block. Building the blocks is
//! a single sequential O(n) pass; comparing the k(k-1)/2 pairs of each block
//! is left to the caller.

use crate::bucket::ListBucket;
use crate::bucket_map::BucketMap;
use crate::error::IterationError;
use crate::record::Record;
use crate::source::RecordSource;
use hashbrown::HashMap;
use tracing::{debug, instrument};

/// Blocking key to the records sharing it, in source order.
pub type Blocks = HashMap<String, Vec<Record>>;

/// Group every record of `source` by its blocking key.
///
/// A source failure aborts the pass and the partial grouping is dropped.
#[instrument(skip_all, level = "debug")]
pub fn block<S: RecordSource>(mut source: S) -> Result<Blocks, IterationError> {
    let mut groups = BucketMap::new(Blocks::new(), ListBucket);
    while let Some(record) = source.next_record()? {
        groups.add(record.blocking_key().to_string(), record);
    }
    let blocks = groups.into_map();

    let summary = BlockSummary::of(&blocks);
    debug!(
        blocks = summary.blocks,
        records = summary.records,
        largest_block = summary.largest_block,
        candidate_pairs = summary.candidate_pairs,
        "blocking pass complete"
    );
    Ok(blocks)
}

/// Group records that cannot fail to load.
pub fn block_records<I>(records: I) -> Blocks
where
    I: IntoIterator<Item = Record>,
{
    let mut groups = BucketMap::new(Blocks::new(), ListBucket);
    for record in records {
        groups.add(record.blocking_key().to_string(), record);
    }
    groups.into_map()
}

/// Every unordered pair `(block[i], block[j])` with `i < j`, in row order.
pub fn unordered_pairs(block: &[Record]) -> impl Iterator<Item = (&Record, &Record)> + '_ {
    block
        .iter()
        .enumerate()
        .flat_map(move |(i, left)| block[i + 1..].iter().map(move |right| (left, right)))
}

/// Number of unordered pairs in a block of `size` records.
#[inline]
pub fn pair_count(size: usize) -> u64 {
    let size = size as u64;
    size * size.saturating_sub(1) / 2
}

/// Shape of a blocking pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockSummary {
    pub blocks: usize,
    pub records: usize,
    pub largest_block: usize,
    pub candidate_pairs: u64,
}

impl BlockSummary {
    pub fn of(blocks: &Blocks) -> Self {
        blocks.values().fold(Self::default(), |mut summary, block| {
            summary.blocks += 1;
            summary.records += block.len();
            summary.largest_block = summary.largest_block.max(block.len());
            summary.candidate_pairs += pair_count(block.len());
            summary
        })
    }
}
