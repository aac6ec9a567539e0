//! rgtune Tournament - Scoring candidate agents against an opponent roster
//!
//! This crate provides tournament infrastructure:
//! - Match batches dispatched over a fixed-size worker pool
//! - Head-to-head comparisons with retry on inconclusive (exactly zero) results
//! - Opponent score caching across tournaments
//! - Tournament winner selection with deterministic tie-breaking
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: Evaluator::run_tournament (orchestration)
//! - Level 2: Evaluator::compare, Evaluator::compare_decisive (phases)
//! - Level 3: run_match, split_games (steps)
//! - Level 4: WorkerPool, PairScoreCache, EvalConfig

mod cache;
mod config;
mod evaluator;
mod match_play;
mod parallel;
mod tournament;

#[cfg(test)]
mod test_support;

pub use cache::PairScoreCache;
pub use config::EvalConfig;
pub use evaluator::{Differential, Evaluator};
pub use match_play::{run_match, split_games, MatchBatch};
pub use parallel::WorkerPool;
pub use tournament::{Entrants, HeadToHead, Standing, TieBreak, TournamentResult};
