//! rgtune Search - Coordinate search over a single constant
//!
//! Hill climbing with a shrinking step: each iteration plays the current
//! value against one step below and one step above it, moves to the winner,
//! and halves the step whenever the current value holds its ground.
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: optimize, optimize_with_callback (orchestration)
//! - Level 2: run_iteration, commit (phases)
//! - Level 3: build_entrants, validate (steps)
//! - Level 4: SearchConfig

mod config;
mod search;

pub use config::SearchConfig;
pub use search::{optimize, optimize_with_callback, IterationReport, SearchResult, Step};
