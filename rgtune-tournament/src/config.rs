//! Configuration types for tournament play
//!
//! Level 4 - Utilities and configuration

/// Configuration for comparisons and tournaments
#[derive(Clone, Debug)]
pub struct EvalConfig {
    /// Games played for every comparison between two agents
    pub matches_per_comparison: usize,
    /// Number of worker threads match batches are spread over
    pub parallelism: usize,
    /// Inclusive upper bound of the per-batch simulation seeds
    pub max_seed: u64,
    /// Re-runs allowed after an exactly tied comparison (0 = unlimited)
    pub max_tie_retries: u32,
    /// Seed of the stream batch seeds are drawn from (None = random)
    pub seed: Option<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            matches_per_comparison: 100,
            parallelism: default_parallelism(),
            max_seed: u32::MAX as u64,
            max_tie_retries: 16,
            seed: None,
        }
    }
}

impl EvalConfig {
    /// Create config with the given number of games per comparison
    pub fn new(matches_per_comparison: usize) -> Self {
        Self {
            matches_per_comparison,
            ..Default::default()
        }
    }

    /// Set the worker pool size
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set the tie retry cap
    pub fn with_max_tie_retries(mut self, retries: u32) -> Self {
        self.max_tie_retries = retries;
        self
    }

    /// Set the largest seed handed to the simulator
    pub fn with_max_seed(mut self, max_seed: u64) -> Self {
        self.max_seed = max_seed;
        self
    }

    /// Make the seed stream reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Available hardware parallelism, at least 1
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
