//! Match play - one batch of games between two agents
//!
//! Level 3 - Step-level implementation

use std::path::Path;

use rgtune_core::{CancelToken, GameScore, Result, Simulator, TuneError};

/// One unit of parallel work: a number of games under a single seed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchBatch {
    pub games: usize,
    pub seed: u64,
}

/// Split `count` games over `workers` batches.
///
/// The first `count % workers` batches get one extra game, so the sizes
/// differ by at most one and always add up to `count`.
pub fn split_games(count: usize, workers: usize) -> Vec<usize> {
    let workers = workers.max(1);
    let (base, extra) = (count / workers, count % workers);
    (0..workers)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

/// Play `games` games of `agent_a` against `agent_b` and return the summed
/// score differential (positive favors `agent_a`).
pub fn run_match<S: Simulator + ?Sized>(
    simulator: &S,
    agent_a: &Path,
    agent_b: &Path,
    games: usize,
    seed: u64,
    cancel: &CancelToken,
) -> Result<f64> {
    if games == 0 {
        return Ok(0.0);
    }

    let scores = simulator.simulate(agent_a, agent_b, games, seed, cancel)?;
    if scores.len() != games {
        return Err(TuneError::Simulation(format!(
            "expected {} game results for {} vs {}, got {}",
            games,
            agent_a.display(),
            agent_b.display(),
            scores.len()
        )));
    }

    Ok(scores.iter().map(GameScore::differential).sum())
}
