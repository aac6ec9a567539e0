//! rgtune Core - Constant variants, the simulator boundary and shared types
//!
//! This crate provides the pieces every other layer builds on:
//! - Locating and rewriting a tuned constant inside an agent source file
//! - Candidate artifacts that clean up after themselves
//! - The `Simulator` boundary and a shared cancellation token
//! - The error taxonomy used across the workspace
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 2: materialize (write one artifact per candidate value)
//! - Level 3: patch_constant, parse_constant (pure text transforms)
//! - Level 4: CancelToken, TuneError, naming utilities

pub mod candidate;
pub mod cancel;
pub mod error;
pub mod simulator;
pub mod variant;

pub use candidate::Candidate;
pub use cancel::CancelToken;
pub use error::{Result, TuneError};
pub use simulator::{GameScore, Simulator};
pub use variant::{
    format_value, get_current_value, materialize, materialize_one, parse_constant,
    patch_constant, variant_path, ConstantSpec,
};
