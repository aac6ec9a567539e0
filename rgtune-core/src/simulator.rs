//! The match-simulation boundary
//!
//! Level 4 - Interface to the external game engine

use std::path::Path;

use crate::cancel::CancelToken;
use crate::error::Result;

/// Final scores of one simulated game
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameScore {
    /// Score of the first-named agent
    pub a: f64,
    /// Score of the second-named agent
    pub b: f64,
}

impl GameScore {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// `a - b`; positive favors the first-named agent
    pub fn differential(&self) -> f64 {
        self.a - self.b
    }
}

/// Plays games between two agent programs.
///
/// Implementations are shared by every worker of the pool, so they must not
/// rely on mutable state. A long-running simulation should watch `cancel`
/// and give up with `TuneError::Cancelled` once it fires.
pub trait Simulator: Send + Sync {
    /// Play `games` games of `agent_a` against `agent_b` seeded with `seed`
    fn simulate(
        &self,
        agent_a: &Path,
        agent_b: &Path,
        games: usize,
        seed: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<GameScore>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_differential_sign() {
        assert_eq!(GameScore::new(12.0, 7.0).differential(), 5.0);
        assert_eq!(GameScore::new(3.0, 9.5).differential(), -6.5);
    }
}
