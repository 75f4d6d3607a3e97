//! Default constants for linktally configuration.

// =============================================================================
// Pair Comparison Defaults
// =============================================================================

/// Candidate pair count below which a pass stays on the calling thread.
pub const DEFAULT_PARALLEL_THRESHOLD: u64 = 10_000;

/// Parallel threshold for the high-throughput profile.
pub const HIGH_THROUGHPUT_PARALLEL_THRESHOLD: u64 = 1_000;

/// Block size cap for the bounded-blocks profile.
/// A block of this size already yields ~12.5M candidate pairs.
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 5_000;

/// Worker count of zero lets rayon size the pool from available parallelism.
pub const AUTO_WORKERS: usize = 0;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "LINKTALLY_";

/// Number of worker threads the pool will use for `workers`.
pub fn effective_workers(workers: usize) -> usize {
    if workers != AUTO_WORKERS {
        return workers;
    }
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}
