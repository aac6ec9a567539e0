//! Comparisons between two agents
//!
//! Level 2 - Phase-level implementation

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rgtune_core::{CancelToken, Result, Simulator, TuneError};

use crate::config::EvalConfig;
use crate::match_play::{run_match, split_games, MatchBatch};
use crate::parallel::WorkerPool;

/// Outcome of a comparison that is re-run while it comes out exactly even
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Differential {
    /// A nonzero summed differential
    Decisive(f64),
    /// Every attempt ended exactly even
    Tied { attempts: u32 },
}

impl Differential {
    /// Summed differential, 0 for a tie
    pub fn value(&self) -> f64 {
        match *self {
            Differential::Decisive(value) => value,
            Differential::Tied { .. } => 0.0,
        }
    }

    pub fn is_decisive(&self) -> bool {
        matches!(self, Differential::Decisive(_))
    }
}

/// Plays comparisons over a worker pool and runs tournaments.
///
/// Owns the pool, the simulator, and the seed stream. Only one tournament
/// runs on an evaluator at a time.
pub struct Evaluator<S> {
    simulator: S,
    pool: WorkerPool,
    config: EvalConfig,
    rng: ChaCha8Rng,
    cancel: CancelToken,
}

impl<S: Simulator> Evaluator<S> {
    /// Create an evaluator with a pool of `config.parallelism` workers
    pub fn new(simulator: S, config: EvalConfig, cancel: CancelToken) -> Result<Self> {
        if config.matches_per_comparison == 0 {
            return Err(TuneError::InvalidConfig(
                "at least one game per comparison is required".to_string(),
            ));
        }
        let pool = WorkerPool::new(config.parallelism)?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            simulator,
            pool,
            config,
            rng,
            cancel,
        })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    /// Token that interrupts this evaluator's work
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Play `count` games of `agent_a` against `agent_b` spread over the
    /// worker pool and return the summed differential.
    ///
    /// Each worker gets one batch with its own seed. Batches that would
    /// play no games are not dispatched.
    pub fn compare(&mut self, count: usize, agent_a: &Path, agent_b: &Path) -> Result<f64> {
        self.cancel.check()?;

        let workers = self.pool.size();
        let batches: Vec<MatchBatch> = split_games(count, workers)
            .into_iter()
            .filter(|&games| games > 0)
            .map(|games| MatchBatch {
                games,
                seed: self.draw_seed(),
            })
            .collect();

        tracing::debug!(
            "{} vs {}: {} games in {} batches",
            agent_a.display(),
            agent_b.display(),
            count,
            batches.len()
        );

        let simulator = &self.simulator;
        let cancel = &self.cancel;
        self.pool.try_sum(&batches, cancel, |batch| {
            run_match(simulator, agent_a, agent_b, batch.games, batch.seed, cancel)
        })
    }

    /// Compare until the result is nonzero.
    ///
    /// An exactly even result is inconclusive and the comparison is played
    /// again. After `max_tie_retries` re-runs (when nonzero) the pair is
    /// reported as `Tied`. Zero games can never be decisive and are rejected.
    pub fn compare_decisive(
        &mut self,
        count: usize,
        agent_a: &Path,
        agent_b: &Path,
    ) -> Result<Differential> {
        if count == 0 {
            return Err(TuneError::InvalidConfig(
                "a decisive comparison needs at least one game".to_string(),
            ));
        }
        let max_retries = self.config.max_tie_retries;
        let mut attempts: u32 = 0;

        loop {
            let diff = self.compare(count, agent_a, agent_b)?;
            attempts += 1;

            if diff != 0.0 {
                return Ok(Differential::Decisive(diff));
            }
            if max_retries != 0 && attempts > max_retries {
                return Ok(Differential::Tied { attempts });
            }

            tracing::info!(
                "{} vs {} was a tie, retrying",
                agent_a.display(),
                agent_b.display()
            );
        }
    }

    fn draw_seed(&mut self) -> u64 {
        let max_seed = self.config.max_seed;
        self.rng.gen_range(0..=max_seed)
    }
}
