//! Tournament execution - candidates against a fixed opponent roster
//!
//! Level 1 - Orchestration and Level 3 - Steps

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;

use rgtune_core::{format_value, Candidate, Result, Simulator, TuneError};

use crate::cache::PairScoreCache;
use crate::evaluator::{Differential, Evaluator};

/// Candidates entering one tournament
#[derive(Debug)]
pub struct Entrants {
    candidates: Vec<Candidate>,
    incumbent: Option<usize>,
}

impl Entrants {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            incumbent: None,
        }
    }

    /// Mark the candidate that keeps its place when a tie cannot be broken
    pub fn with_incumbent(mut self, index: usize) -> Self {
        self.incumbent = (index < self.candidates.len()).then_some(index);
        self
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn incumbent(&self) -> Option<usize> {
        self.incumbent
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Final running total of one candidate
#[derive(Clone, Debug, Serialize)]
pub struct Standing {
    /// Index of the candidate in the entrants
    pub index: usize,
    /// Constant value the candidate carries
    pub value: f64,
    /// Artifact the candidate was scored as
    pub path: PathBuf,
    /// Summed differential against the whole roster
    pub total: f64,
}

/// One direct comparison played to separate tied leaders
#[derive(Clone, Debug, Serialize)]
pub struct HeadToHead {
    pub first: usize,
    pub second: usize,
    /// Differential from `first`'s point of view, 0 if it never broke
    pub differential: f64,
}

/// How a tie at the top was resolved
#[derive(Clone, Debug, Serialize)]
pub struct TieBreak {
    /// Indices of the candidates sharing the best total
    pub contenders: Vec<usize>,
    pub games: Vec<HeadToHead>,
    pub winner: usize,
}

/// Result of a tournament
#[derive(Debug)]
pub struct TournamentResult {
    /// The single surviving candidate; every other artifact has been deleted
    pub winner: Candidate,
    /// Index of the winner in the entrants
    pub winner_index: usize,
    /// One standing per entrant, in entry order
    pub standings: Vec<Standing>,
    pub tie_break: Option<TieBreak>,
}

impl TournamentResult {
    /// Total of the winning candidate
    pub fn winner_total(&self) -> f64 {
        self.standings[self.winner_index].total
    }

    pub fn standing_for(&self, index: usize) -> Option<&Standing> {
        self.standings.get(index)
    }
}

// ============================================================================
// Level 1 - Orchestration
// ============================================================================

impl<S: Simulator> Evaluator<S> {
    /// Run a tournament (Level 1 orchestration)
    ///
    /// Every candidate is compared against every opponent, reusing scores
    /// from `cache` where one exists. The candidate with the best total
    /// wins; candidates sharing the best total are separated by direct
    /// comparisons between them. All other candidates are dropped, which
    /// deletes their artifacts. On error every candidate is dropped.
    ///
    /// # Arguments
    /// * `opponents` - Fixed roster, never modified
    /// * `entrants` - Candidates to score
    /// * `cache` - Opponent scores carried over from earlier tournaments
    pub fn run_tournament(
        &mut self,
        opponents: &[PathBuf],
        entrants: Entrants,
        cache: &mut PairScoreCache,
    ) -> Result<TournamentResult> {
        if entrants.is_empty() {
            return Err(TuneError::InvalidConfig(
                "a tournament needs at least one candidate".to_string(),
            ));
        }
        let Entrants {
            mut candidates,
            incumbent,
        } = entrants;

        let totals = self.score_against_roster(opponents, &candidates, cache)?;
        let leaders = leading_candidates(&totals);

        let tie_break = if leaders.len() > 1 {
            Some(self.break_tie(&candidates, &leaders, incumbent)?)
        } else {
            None
        };
        let winner_index = tie_break.as_ref().map_or(leaders[0], |tb| tb.winner);

        let standings = candidates
            .iter()
            .zip(&totals)
            .enumerate()
            .map(|(index, (candidate, &total))| Standing {
                index,
                value: candidate.value(),
                path: candidate.path().to_path_buf(),
                total,
            })
            .collect();

        let winner = candidates.swap_remove(winner_index);
        drop(candidates);

        tracing::info!(
            "best score: {} ({})",
            totals[winner_index],
            winner.path().display()
        );

        Ok(TournamentResult {
            winner,
            winner_index,
            standings,
            tie_break,
        })
    }

    // ========================================================================
    // Level 3 - Steps
    // ========================================================================

    /// Total differential of every candidate against the whole roster
    fn score_against_roster(
        &mut self,
        opponents: &[PathBuf],
        candidates: &[Candidate],
        cache: &mut PairScoreCache,
    ) -> Result<Vec<f64>> {
        let count = self.config().matches_per_comparison;
        let mut totals = vec![0.0; candidates.len()];

        for opponent in opponents {
            for (total, candidate) in totals.iter_mut().zip(candidates) {
                self.cancel_token().check()?;
                *total += self.score_pair(count, opponent, candidate.path(), cache)?;
            }
            tracing::info!(
                "after {}: {}",
                opponent.display(),
                format_totals(candidates, &totals)
            );
        }

        Ok(totals)
    }

    /// Score of one candidate against one opponent, from cache if possible
    fn score_pair(
        &mut self,
        count: usize,
        opponent: &Path,
        candidate: &Path,
        cache: &mut PairScoreCache,
    ) -> Result<f64> {
        if let Some(score) = cache.get(opponent, candidate) {
            tracing::debug!("already scored {} against {}", candidate.display(), opponent.display());
            return Ok(score);
        }

        match self.compare_decisive(count, candidate, opponent)? {
            Differential::Decisive(score) => {
                cache.insert(opponent, candidate, score);
                Ok(score)
            }
            Differential::Tied { attempts } => {
                tracing::warn!(
                    "{} and {} tied {} times in a row, scoring 0",
                    candidate.display(),
                    opponent.display(),
                    attempts
                );
                Ok(0.0)
            }
        }
    }

    /// Separate candidates sharing the best total.
    ///
    /// Every pair of contenders plays one decisive comparison. Contenders
    /// rank by comparisons won, then by summed differential, then the
    /// incumbent first, then entry order.
    fn break_tie(
        &mut self,
        candidates: &[Candidate],
        contenders: &[usize],
        incumbent: Option<usize>,
    ) -> Result<TieBreak> {
        tracing::info!(
            "{} candidates share the best score, playing them off",
            contenders.len()
        );
        let count = self.config().matches_per_comparison;
        let mut wins = vec![0u32; candidates.len()];
        let mut margin = vec![0.0; candidates.len()];
        let mut games = Vec::new();

        for (pos, &first) in contenders.iter().enumerate() {
            for &second in &contenders[pos + 1..] {
                self.cancel_token().check()?;
                let outcome = self.compare_decisive(
                    count,
                    candidates[first].path(),
                    candidates[second].path(),
                )?;

                let differential = outcome.value();
                if differential > 0.0 {
                    wins[first] += 1;
                } else if differential < 0.0 {
                    wins[second] += 1;
                }
                margin[first] += differential;
                margin[second] -= differential;

                tracing::info!(
                    "{} vs {}: {}",
                    format_value(candidates[first].value()),
                    format_value(candidates[second].value()),
                    differential
                );
                games.push(HeadToHead {
                    first,
                    second,
                    differential,
                });
            }
        }

        let winner = contenders
            .iter()
            .copied()
            .min_by(|&a, &b| {
                wins[b]
                    .cmp(&wins[a])
                    .then_with(|| margin[b].partial_cmp(&margin[a]).unwrap_or(Ordering::Equal))
                    .then_with(|| (Some(b) == incumbent).cmp(&(Some(a) == incumbent)))
                    .then_with(|| a.cmp(&b))
            })
            .unwrap_or(contenders[0]);

        Ok(TieBreak {
            contenders: contenders.to_vec(),
            games,
            winner,
        })
    }
}

// ============================================================================
// Level 4 - Utilities
// ============================================================================

/// Indices of every candidate holding the best total, in entry order
fn leading_candidates(totals: &[f64]) -> Vec<usize> {
    let best = totals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let leaders: Vec<usize> = (0..totals.len()).filter(|&i| totals[i] == best).collect();
    if leaders.is_empty() {
        vec![0]
    } else {
        leaders
    }
}

fn format_totals(candidates: &[Candidate], totals: &[f64]) -> String {
    candidates
        .iter()
        .zip(totals)
        .map(|(candidate, total)| format!("{}={}", format_value(candidate.value()), total))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalConfig;
    use crate::test_support::{agent, x_of, FnSimulator, ScriptedSimulator};
    use rgtune_core::CancelToken;
    use std::fs;

    fn config() -> EvalConfig {
        EvalConfig::new(4).with_parallelism(1).with_seed(1)
    }

    fn entrants(dir: &Path, values: &[f64]) -> Entrants {
        let candidates = values
            .iter()
            .map(|&v| Candidate::new(v, agent(dir, &format!("bot_X_{}.py", v), v)))
            .collect();
        Entrants::new(candidates)
    }

    fn opponent(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "pass\n").unwrap();
        path
    }

    #[test]
    fn test_leading_candidates() {
        assert_eq!(leading_candidates(&[1.0, 5.0, 3.0]), vec![1]);
        assert_eq!(leading_candidates(&[5.0, -1.0, 5.0]), vec![0, 2]);
        assert_eq!(leading_candidates(&[-2.0]), vec![0]);
    }

    #[test]
    fn test_entrants_incumbent_out_of_range() {
        let entrants = Entrants::new(Vec::new()).with_incumbent(0);
        assert!(entrants.is_empty());
        assert_eq!(entrants.incumbent(), None);
    }

    #[test]
    fn test_best_total_wins_and_losers_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let roster = vec![opponent(dir.path(), "a.py"), opponent(dir.path(), "b.py")];
        let field = entrants(dir.path(), &[1.0, 3.0, 2.0]);
        let paths: Vec<PathBuf> = field.candidates().iter().map(|c| c.path().to_path_buf()).collect();

        let sim = FnSimulator::new(|a, b| x_of(a) - x_of(b));
        let mut evaluator = Evaluator::new(sim, config(), CancelToken::new()).unwrap();
        let mut cache = PairScoreCache::new();

        let result = evaluator.run_tournament(&roster, field, &mut cache).unwrap();

        assert_eq!(result.winner.value(), 3.0);
        assert_eq!(result.winner_index, 1);
        assert_eq!(result.winner_total(), 24.0);
        assert!(result.tie_break.is_none());
        assert_eq!(result.standing_for(0).unwrap().total, 8.0);
        assert!(result
            .standings
            .iter()
            .all(|s| s.total <= result.winner_total()));

        assert!(!paths[0].exists());
        assert!(paths[1].exists());
        assert!(!paths[2].exists());
        assert!(roster.iter().all(|p| p.exists()));
        assert_eq!(cache.len(), 6);
    }

    #[test]
    fn test_exact_zero_is_replayed() {
        let dir = tempfile::tempdir().unwrap();
        let roster = vec![opponent(dir.path(), "enemy.py")];
        let field = entrants(dir.path(), &[1.0, 2.0]);

        let sim = ScriptedSimulator::new(&[0.0, 3.0, 2.0]);
        let mut evaluator = Evaluator::new(sim, config(), CancelToken::new()).unwrap();
        let mut cache = PairScoreCache::new();

        let result = evaluator.run_tournament(&roster, field, &mut cache).unwrap();

        assert_eq!(result.winner.value(), 1.0);
        assert_eq!(result.standings[0].total, 3.0);
        assert_eq!(result.standings[1].total, 2.0);
        assert_eq!(evaluator.simulator().calls().len(), 3);
        assert_eq!(cache.get(&roster[0], &result.standings[0].path), Some(3.0));
    }

    #[test]
    fn test_cached_scores_are_reused() {
        let dir = tempfile::tempdir().unwrap();
        let roster = vec![opponent(dir.path(), "enemy.py")];

        let sim = ScriptedSimulator::new(&[5.0, 1.0, 4.0]);
        let mut evaluator = Evaluator::new(sim, config(), CancelToken::new()).unwrap();
        let mut cache = PairScoreCache::new();

        let first = evaluator
            .run_tournament(&roster, entrants(dir.path(), &[1.0, 2.0]), &mut cache)
            .unwrap();
        assert_eq!(first.winner.value(), 1.0);
        let survivor = first.winner;

        // The survivor comes back with a fresh neighbour; only the newcomer plays.
        let candidates = vec![
            Candidate::new(3.0, agent(dir.path(), "bot_X_3.py", 3.0)),
            survivor,
        ];
        let second = evaluator
            .run_tournament(&roster, Entrants::new(candidates), &mut cache)
            .unwrap();

        assert_eq!(second.winner.value(), 1.0);
        assert_eq!(second.standings[1].total, 5.0);
        assert_eq!(evaluator.simulator().calls().len(), 3);
    }

    #[test]
    fn test_two_way_tie_is_decided_head_to_head() {
        let dir = tempfile::tempdir().unwrap();
        let roster = vec![opponent(dir.path(), "enemy.py")];
        let field = entrants(dir.path(), &[1.0, 4.0, 2.0]);
        let loser = field.candidates()[0].path().to_path_buf();

        // Against the roster 1 and 2 score the same; head to head 2 is stronger.
        let sim = FnSimulator::new(|a, b| {
            let (x, y) = (x_of(a), x_of(b));
            if y == 0.0 {
                if x == 4.0 { -1.0 } else { 1.0 }
            } else {
                x - y
            }
        });
        let mut evaluator = Evaluator::new(sim, config(), CancelToken::new()).unwrap();
        let mut cache = PairScoreCache::new();

        let result = evaluator.run_tournament(&roster, field, &mut cache).unwrap();

        assert_eq!(result.winner.value(), 2.0);
        let tie_break = result.tie_break.as_ref().unwrap();
        assert_eq!(tie_break.contenders, vec![0, 2]);
        assert_eq!(tie_break.games.len(), 1);
        assert_eq!(tie_break.games[0].differential, -4.0);
        assert!(!loser.exists());
    }

    #[test]
    fn test_three_way_tie_round_robin() {
        let dir = tempfile::tempdir().unwrap();
        let roster = vec![opponent(dir.path(), "enemy.py")];
        let field = entrants(dir.path(), &[1.0, 2.0, 3.0]);

        // Everyone scores 1 against the roster; 3 beats both others directly.
        let sim = FnSimulator::new(|a, b| {
            let (x, y) = (x_of(a), x_of(b));
            if y == 0.0 {
                1.0
            } else {
                x - y
            }
        });
        let mut evaluator = Evaluator::new(sim, config(), CancelToken::new()).unwrap();
        let mut cache = PairScoreCache::new();

        let result = evaluator.run_tournament(&roster, field, &mut cache).unwrap();

        assert_eq!(result.winner.value(), 3.0);
        let tie_break = result.tie_break.unwrap();
        assert_eq!(tie_break.contenders, vec![0, 1, 2]);
        assert_eq!(tie_break.games.len(), 3);
    }

    #[test]
    fn test_cyclic_tie_keeps_incumbent() {
        let dir = tempfile::tempdir().unwrap();
        let roster = vec![opponent(dir.path(), "enemy.py")];
        let field = entrants(dir.path(), &[1.0, 2.0, 3.0]).with_incumbent(1);

        // 1 beats 2, 2 beats 3, 3 beats 1, all by the same margin.
        let sim = FnSimulator::new(|a, b| {
            let (x, y) = (x_of(a), x_of(b));
            match (x as i32, y as i32) {
                (_, 0) => 1.0,
                (1, 2) | (2, 3) | (3, 1) => 1.0,
                _ => -1.0,
            }
        });
        let mut evaluator = Evaluator::new(sim, config(), CancelToken::new()).unwrap();
        let mut cache = PairScoreCache::new();

        let result = evaluator.run_tournament(&roster, field, &mut cache).unwrap();
        assert_eq!(result.winner.value(), 2.0);
    }

    #[test]
    fn test_unbreakable_tie_keeps_incumbent() {
        let dir = tempfile::tempdir().unwrap();
        let roster = vec![opponent(dir.path(), "enemy.py")];
        let field = entrants(dir.path(), &[1.0, 2.0]).with_incumbent(1);

        let sim = FnSimulator::new(|_, b| if x_of(b) == 0.0 { 1.0 } else { 0.0 });
        let config = config().with_max_tie_retries(2);
        let mut evaluator = Evaluator::new(sim, config, CancelToken::new()).unwrap();
        let mut cache = PairScoreCache::new();

        let result = evaluator.run_tournament(&roster, field, &mut cache).unwrap();
        assert_eq!(result.winner.value(), 2.0);
        assert_eq!(result.tie_break.unwrap().games[0].differential, 0.0);
    }

    #[test]
    fn test_cancelled_tournament_removes_every_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let roster = vec![opponent(dir.path(), "enemy.py")];
        let field = entrants(dir.path(), &[1.0, 2.0, 3.0]);
        let paths: Vec<PathBuf> = field.candidates().iter().map(|c| c.path().to_path_buf()).collect();

        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let sim = FnSimulator::new(move |a, _| {
            if x_of(a) == 2.0 {
                trigger.cancel();
            }
            1.0
        });
        let mut evaluator = Evaluator::new(sim, config(), cancel).unwrap();
        let mut cache = PairScoreCache::new();

        let err = evaluator.run_tournament(&roster, field, &mut cache).unwrap_err();

        assert!(err.is_cancelled());
        assert!(paths.iter().all(|p| !p.exists()));
        assert!(roster[0].exists());
    }

    #[test]
    fn test_simulation_error_removes_every_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let roster = vec![opponent(dir.path(), "enemy.py")];
        let field = entrants(dir.path(), &[1.0, 2.0]);
        let paths: Vec<PathBuf> = field.candidates().iter().map(|c| c.path().to_path_buf()).collect();

        let sim = ScriptedSimulator::new(&[2.0]);
        let mut evaluator = Evaluator::new(sim, config(), CancelToken::new()).unwrap();
        let mut cache = PairScoreCache::new();

        let err = evaluator.run_tournament(&roster, field, &mut cache).unwrap_err();
        assert!(matches!(err, TuneError::Simulation(_)));
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[test]
    fn test_empty_tournament_is_rejected() {
        let sim = FnSimulator::new(|_, _| 1.0);
        let mut evaluator = Evaluator::new(sim, config(), CancelToken::new()).unwrap();
        let err = evaluator
            .run_tournament(&[], Entrants::new(Vec::new()), &mut PairScoreCache::new())
            .unwrap_err();
        assert!(matches!(err, TuneError::InvalidConfig(_)));
    }
}
