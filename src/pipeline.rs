//! # Linkage Pipeline
//!
//! Drives a full pass: block a record source, enumerate the unordered pairs
//! of every block and tally their comparison patterns.
//!
//! ## Architecture
//!
//! ```text
//!        RecordSource (one-shot, sequential)
//!                     │
//!               block() ── Blocks
//!                     │
//!     ┌───────────────┼───────────────┐
//!     ▼               ▼               ▼
//! (block, row)    (block, row)    (block, row)
//!  worker 0        worker 1        worker N
//!  private tally   private tally   private tally
//!     └───────────────┼───────────────┘
//!                     ▼
//!           merge (key-wise sum)
//!                     ▼
//!                   Tally
//! ```
//!
//! Work items are block rows, so a single large block still spreads across
//! workers. Each worker owns its tally; no lock is taken while comparing.

use crate::blocking::{self, pair_count, BlockSummary, Blocks};
use crate::comparator::RecordComparator;
use crate::config::{effective_workers, LinkageConfig, PairErrorPolicy, TallyTuning, AUTO_WORKERS};
use crate::error::{ComparatorError, IterationError, LinkageError};
use crate::record::Record;
use crate::source::RecordSource;
use crate::tally::{IncrementalTally, Tally};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::{Arc, OnceLock};
use tracing::{debug, instrument, warn};

/// Result of tallying a set of blocks.
#[derive(Debug, Clone)]
pub struct TallyOutcome {
    pub tally: Tally,
    /// Pairs whose pattern was counted
    pub pairs_compared: u64,
    /// Pairs dropped because the comparator failed under the skip policy
    pub pairs_skipped: u64,
    /// Blocks dropped for exceeding the size cap
    pub blocks_skipped: usize,
}

/// Per-worker accumulation state.
#[derive(Debug)]
struct WorkerTally {
    tally: IncrementalTally,
    compared: u64,
    skipped: u64,
}

impl WorkerTally {
    fn new(comparator: &Arc<dyn RecordComparator>) -> Self {
        Self {
            tally: IncrementalTally::new(Arc::clone(comparator)),
            compared: 0,
            skipped: 0,
        }
    }

    /// Compare `block[row]` with every later record of the block.
    fn compare_row(
        &mut self,
        block: &[Record],
        row: usize,
        policy: PairErrorPolicy,
    ) -> Result<(), ComparatorError> {
        let left = &block[row];
        for right in &block[row + 1..] {
            match self.tally.add(left, right) {
                Ok(_) => self.compared += 1,
                Err(err) => match policy {
                    PairErrorPolicy::Abort => return Err(err),
                    PairErrorPolicy::Skip => {
                        warn!(
                            block = left.blocking_key(),
                            left = left.seq(),
                            right = right.seq(),
                            error = %err,
                            "skipping pair"
                        );
                        self.skipped += 1;
                    }
                },
            }
        }
        Ok(())
    }

    fn merge(self, other: WorkerTally) -> WorkerTally {
        WorkerTally {
            tally: self.tally.merge(other.tally),
            compared: self.compared + other.compared,
            skipped: self.skipped + other.skipped,
        }
    }

    fn finish(self, blocks_skipped: usize) -> TallyOutcome {
        debug!(
            pairs_compared = self.compared,
            pairs_skipped = self.skipped,
            blocks_skipped,
            distinct_patterns = self.tally.distinct_patterns(),
            "tally complete"
        );
        TallyOutcome {
            tally: self.tally.tally(),
            pairs_compared: self.compared,
            pairs_skipped: self.skipped,
            blocks_skipped,
        }
    }
}

/// Block-and-tally driver sharing one comparator across every worker.
///
/// With `workers == 0` parallel passes run on rayon's global pool. An explicit
/// worker count gets a dedicated pool, built on first use and shared by
/// clones.
#[derive(Debug, Clone)]
pub struct Linkage {
    comparator: Arc<dyn RecordComparator>,
    tuning: TallyTuning,
    pool: OnceLock<Arc<ThreadPool>>,
}

impl Linkage {
    pub fn new(comparator: Arc<dyn RecordComparator>, tuning: TallyTuning) -> Self {
        Self {
            comparator,
            tuning,
            pool: OnceLock::new(),
        }
    }

    pub fn from_config(comparator: Arc<dyn RecordComparator>, config: &LinkageConfig) -> Self {
        Self::new(comparator, config.tuning())
    }

    pub fn comparator(&self) -> &Arc<dyn RecordComparator> {
        &self.comparator
    }

    pub fn tuning(&self) -> &TallyTuning {
        &self.tuning
    }

    pub fn block<S: RecordSource>(&self, source: S) -> Result<Blocks, IterationError> {
        blocking::block(source)
    }

    /// Block `source`, then tally every within-block pair.
    pub fn run<S: RecordSource>(&self, source: S) -> Result<TallyOutcome, LinkageError> {
        let blocks = self.block(source)?;
        self.tally_blocks(&blocks)
    }

    /// Tally on the calling thread or on the pool, depending on the number
    /// of candidate pairs.
    pub fn tally_blocks(&self, blocks: &Blocks) -> Result<TallyOutcome, LinkageError> {
        let summary = BlockSummary::of(blocks);
        if self.tuning.runs_parallel(summary.candidate_pairs) {
            self.tally_parallel(blocks)
        } else {
            Ok(self.tally_sequential(blocks)?)
        }
    }

    #[instrument(skip_all, level = "debug")]
    pub fn tally_sequential(&self, blocks: &Blocks) -> Result<TallyOutcome, ComparatorError> {
        let policy = self.tuning.on_pair_error;
        let mut worker = WorkerTally::new(&self.comparator);
        let mut blocks_skipped = 0;

        for (key, block) in blocks {
            if !self.admits(key, block) {
                blocks_skipped += 1;
                continue;
            }
            for row in 0..block.len() {
                worker.compare_row(block, row, policy)?;
            }
        }

        Ok(worker.finish(blocks_skipped))
    }

    #[instrument(skip_all, level = "debug")]
    pub fn tally_parallel(&self, blocks: &Blocks) -> Result<TallyOutcome, LinkageError> {
        let policy = self.tuning.on_pair_error;
        let pool = self.dedicated_pool()?;

        let admitted: Vec<&[Record]> = blocks
            .iter()
            .filter(|(key, block)| self.admits(key, block))
            .map(|(_, block)| block.as_slice())
            .collect();
        let blocks_skipped = blocks.len() - admitted.len();
        debug!(
            workers = effective_workers(self.tuning.workers),
            blocks = admitted.len(),
            "starting parallel tally"
        );

        let tally_admitted = || {
            admitted
                .par_iter()
                .flat_map_iter(|&block| (0..block.len()).map(move |row| (block, row)))
                .try_fold(
                    || WorkerTally::new(&self.comparator),
                    |mut worker, (block, row)| {
                        worker.compare_row(block, row, policy)?;
                        Ok::<_, ComparatorError>(worker)
                    },
                )
                .try_reduce(
                    || WorkerTally::new(&self.comparator),
                    |left, right| Ok(left.merge(right)),
                )
        };
        let worker = match pool {
            Some(pool) => pool.install(tally_admitted),
            None => tally_admitted(),
        }?;

        Ok(worker.finish(blocks_skipped))
    }

    fn dedicated_pool(&self) -> Result<Option<&ThreadPool>, LinkageError> {
        if self.tuning.workers == AUTO_WORKERS {
            return Ok(None);
        }
        if let Some(pool) = self.pool.get() {
            return Ok(Some(&**pool));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.tuning.workers)
            .thread_name(|i| format!("linktally-{i}"))
            .build()?;
        Ok(Some(&**self.pool.get_or_init(|| Arc::new(pool))))
    }

    fn admits(&self, key: &str, block: &[Record]) -> bool {
        match self.tuning.max_block_size {
            Some(max) if block.len() > max => {
                warn!(
                    block = key,
                    size = block.len(),
                    max,
                    pairs = pair_count(block.len()),
                    "skipping oversized block"
                );
                false
            }
            _ => true,
        }
    }
}
