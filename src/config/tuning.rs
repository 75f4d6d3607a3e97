use super::defaults::*;
use serde::{Deserialize, Serialize};

/// What to do when the comparator fails on a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairErrorPolicy {
    /// Abort the pass on the first failing pair
    #[default]
    Abort,
    /// Log the pair, count it as skipped and keep going
    Skip,
}

/// Preset profiles that bundle common tuning choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// All cores once a pass has enough pairs
    #[default]
    Balanced,
    /// Always compare on the calling thread
    Sequential,
    /// All cores, low parallel threshold
    HighThroughput,
    /// Skip oversized blocks and failing pairs instead of aborting
    BoundedBlocks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyTuning {
    /// Worker threads for parallel passes (0 = available parallelism)
    pub workers: usize,
    /// Minimum candidate pairs before a pass runs in parallel
    pub parallel_threshold: u64,
    /// Blocks larger than this are skipped
    pub max_block_size: Option<usize>,
    pub on_pair_error: PairErrorPolicy,
}

impl Default for TallyTuning {
    fn default() -> Self {
        Self {
            workers: AUTO_WORKERS,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            max_block_size: None,
            on_pair_error: PairErrorPolicy::Abort,
        }
    }
}

impl TallyTuning {
    pub fn from_profile(profile: Profile) -> Self {
        match profile {
            Profile::Balanced => Self::balanced(),
            Profile::Sequential => Self::sequential(),
            Profile::HighThroughput => Self::high_throughput(),
            Profile::BoundedBlocks => Self::bounded_blocks(),
        }
    }

    pub fn balanced() -> Self {
        Self::default()
    }

    pub fn sequential() -> Self {
        Self {
            workers: 1,
            parallel_threshold: u64::MAX,
            ..Self::default()
        }
    }

    pub fn high_throughput() -> Self {
        Self {
            parallel_threshold: HIGH_THROUGHPUT_PARALLEL_THRESHOLD,
            ..Self::default()
        }
    }

    pub fn bounded_blocks() -> Self {
        Self {
            max_block_size: Some(DEFAULT_MAX_BLOCK_SIZE),
            on_pair_error: PairErrorPolicy::Skip,
            ..Self::default()
        }
    }

    /// Whether a pass over `candidate_pairs` pairs should use the pool.
    pub fn runs_parallel(&self, candidate_pairs: u64) -> bool {
        self.workers != 1 && candidate_pairs >= self.parallel_threshold
    }
}
