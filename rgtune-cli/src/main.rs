//! rgtune CLI - Command-line interface
//!
//! Commands:
//! - tune: Hill-climb a constant against an opponent roster
//! - value: Print a constant's current value
//! - versus: Compare two agents directly

mod simulator;
mod tune;
mod value;
mod versus;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rgtune_core::{CancelToken, TuneError};

use crate::simulator::SimulatorArgs;

/// Exit status after an interrupt (128 + SIGINT)
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "rgtune")]
#[command(about = "Tune a numeric constant in a game agent by tournament play")]
struct Cli {
    /// Seed for the simulation seed stream (random when omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(flatten)]
    simulator: SimulatorArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tune a constant and write the best value back to its file
    Tune(tune::TuneArgs),
    /// Print the current value of a constant
    Value(value::ValueArgs),
    /// Play two agents against each other and print the score differential
    Versus(versus::VersusArgs),
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let cancel = CancelToken::new();

    match run(cli, cancel.clone()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if cancel.is_cancelled() || is_interrupt(&e) => {
            tracing::warn!("interrupted, no changes written");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, cancel: CancelToken) -> Result<()> {
    let Cli {
        seed,
        simulator,
        command,
    } = cli;

    match command {
        Commands::Tune(args) => with_interrupts(cancel, move |cancel| {
            tune::run(args, &simulator, seed, cancel)
        }),
        Commands::Value(args) => value::run(args),
        Commands::Versus(args) => with_interrupts(cancel, move |cancel| {
            versus::run(args, &simulator, seed, cancel)
        }),
    }
}

/// Run `work` on a blocking thread while Ctrl-C is translated into
/// cancellation of `cancel`.
fn with_interrupts<F>(cancel: CancelToken, work: F) -> Result<()>
where
    F: FnOnce(CancelToken) -> Result<()> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(async move {
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, terminating workers, please wait...");
                    cancel.cancel();
                }
            })
        };

        let outcome = tokio::task::spawn_blocking(move || work(cancel))
            .await
            .context("worker thread panicked");
        watcher.abort();
        outcome?
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn is_interrupt(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<TuneError>()
            .map_or(false, TuneError::is_cancelled)
    })
}
