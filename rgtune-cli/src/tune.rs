//! Tune command - run the coordinate search for one constant
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_evaluator(), report_results()
//! - Level 3: build_eval_config(), build_search_config()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use rgtune_core::{format_value, CancelToken, ConstantSpec};
use rgtune_search::{optimize_with_callback, IterationReport, SearchConfig, SearchResult, Step};
use rgtune_tournament::{EvalConfig, Evaluator};

use crate::simulator::{CommandSimulator, SimulatorArgs};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct TuneArgs {
    /// Name of the constant to tune
    pub constant: String,

    /// Agent source file holding the constant
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Comma-separated list of opponent agent files
    #[arg(value_name = "OPPONENTS", value_delimiter = ',', required = true)]
    pub opponents: Vec<PathBuf>,

    /// Step size to start adjusting the value with
    #[arg(long, default_value = "8.0")]
    pub precision: f64,

    /// Games played per comparison
    #[arg(short, long, default_value = "100")]
    pub matches: usize,

    /// Worker processes to simulate in (default: available parallelism)
    #[arg(short, long)]
    pub processes: Option<usize>,

    /// Re-runs of an exactly tied comparison before calling it a tie (0 = unlimited)
    #[arg(long, default_value = "16")]
    pub max_tie_retries: u32,

    /// Largest seed handed to the simulator
    #[arg(long)]
    pub max_seed: Option<u64>,

    /// Directory for candidate files (default: next to FILE)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// What `--json` prints
#[derive(Serialize)]
struct TuneSummary<'a> {
    file: &'a PathBuf,
    opponents: &'a [PathBuf],
    #[serde(flatten)]
    result: &'a SearchResult,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run tune command
///
/// 1. Build the evaluator (simulator + worker pool)
/// 2. Run the search, logging each iteration
/// 3. Print the tuned value
pub fn run(
    args: TuneArgs,
    simulator: &SimulatorArgs,
    seed: Option<u64>,
    cancel: CancelToken,
) -> Result<()> {
    let spec = ConstantSpec::new(&args.constant, &args.file);
    let mut evaluator = build_evaluator(&args, simulator, seed, cancel)?;
    let config = build_search_config(&args);

    tracing::info!(
        "Tuning {} in {} against {} opponents: precision={}, matches={}, processes={}",
        spec.name,
        spec.artifact.display(),
        args.opponents.len(),
        args.precision,
        args.matches,
        evaluator.config().parallelism
    );

    let result = optimize_with_callback(&mut evaluator, &spec, &args.opponents, &config, log_iteration)
        .with_context(|| format!("failed to tune {} in {}", spec.name, spec.artifact.display()))?;

    report_results(&result, &args)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_evaluator(
    args: &TuneArgs,
    simulator: &SimulatorArgs,
    seed: Option<u64>,
    cancel: CancelToken,
) -> Result<Evaluator<CommandSimulator>> {
    let simulator = simulator.build()?;
    let config = build_eval_config(args, seed);
    Evaluator::new(simulator, config, cancel).context("failed to set up the evaluator")
}

fn report_results(result: &SearchResult, args: &TuneArgs) -> Result<()> {
    if args.json {
        let summary = TuneSummary {
            file: &args.file,
            opponents: &args.opponents,
            result,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", format_value(result.final_value));
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn build_eval_config(args: &TuneArgs, seed: Option<u64>) -> EvalConfig {
    let mut config = EvalConfig::new(args.matches).with_max_tie_retries(args.max_tie_retries);
    if let Some(processes) = args.processes {
        config = config.with_parallelism(processes);
    }
    if let Some(max_seed) = args.max_seed {
        config = config.with_max_seed(max_seed);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    config
}

fn build_search_config(args: &TuneArgs) -> SearchConfig {
    let config = SearchConfig::new(args.precision);
    match &args.work_dir {
        Some(dir) => config.with_work_dir(dir),
        None => config,
    }
}

// ============================================================================
// LEVEL 4 - FORMATTING
// ============================================================================

fn log_iteration(report: &IterationReport) {
    let outcome = match report.step {
        Step::Moved => "moved",
        Step::Refined => "refined",
    };
    tracing::info!(
        "Iteration {}: base={} precision={} winner={} (total {}) -> {}",
        report.iteration + 1,
        format_value(report.base_value),
        report.precision,
        format_value(report.winner_value),
        report.winner_total,
        outcome
    );
}
