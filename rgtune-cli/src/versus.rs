//! Versus command - compare two agents directly
//!
//! Prints the summed score differential, positive when the first agent
//! scored more.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use rgtune_core::CancelToken;
use rgtune_tournament::{Differential, EvalConfig, Evaluator};

use crate::simulator::SimulatorArgs;

#[derive(Args)]
pub struct VersusArgs {
    /// First agent
    pub first: PathBuf,

    /// Second agent
    pub second: PathBuf,

    /// Games to play
    #[arg(short, long, default_value = "100")]
    pub matches: usize,

    /// Worker processes to simulate in (default: available parallelism)
    #[arg(short, long)]
    pub processes: Option<usize>,

    /// Replay exact ties up to this many times
    #[arg(long, default_value = "0")]
    pub retry_ties: u32,
}

pub fn run(
    args: VersusArgs,
    simulator: &SimulatorArgs,
    seed: Option<u64>,
    cancel: CancelToken,
) -> Result<()> {
    let mut config = EvalConfig::new(args.matches).with_max_tie_retries(args.retry_ties);
    if let Some(processes) = args.processes {
        config = config.with_parallelism(processes);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let mut evaluator = Evaluator::new(simulator.build()?, config, cancel)
        .context("failed to set up the evaluator")?;

    tracing::info!(
        "Comparing {} vs {} ({} games)",
        args.first.display(),
        args.second.display(),
        args.matches
    );

    let differential = if args.retry_ties == 0 {
        evaluator.compare(args.matches, &args.first, &args.second)?
    } else {
        match evaluator.compare_decisive(args.matches, &args.first, &args.second)? {
            Differential::Decisive(value) => value,
            Differential::Tied { attempts } => {
                tracing::warn!("still tied after {} attempts", attempts);
                0.0
            }
        }
    };

    println!("{}", differential);
    Ok(())
}
