//! Subprocess simulator - plays games by running an external program
//!
//! The program is invoked as
//! `<PROGRAM> [ARGS..] <agent_a> <agent_b> <games> <seed>` and prints one
//! line per game holding the two final scores (`score_a score_b`, separated
//! by whitespace or a comma). Blank lines and lines starting with `#` are
//! ignored.
//!
//! On Unix the program runs in its own process group, and cancellation
//! kills the whole group so engines started by a wrapper script stop too.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::Args;

use rgtune_core::{CancelToken, GameScore, Result, Simulator, TuneError};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args, Clone, Debug, Default)]
pub struct SimulatorArgs {
    /// Program that plays games between two agents
    #[arg(long = "simulator", value_name = "PROGRAM", env = "RGTUNE_SIMULATOR", global = true)]
    pub program: Option<PathBuf>,

    /// Extra argument passed to the simulator before the agents (repeatable)
    #[arg(
        long = "simulator-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        global = true
    )]
    pub args: Vec<String>,
}

impl SimulatorArgs {
    /// Build the simulator, failing when no program was configured
    pub fn build(&self) -> anyhow::Result<CommandSimulator> {
        let program = self.program.clone().ok_or_else(|| {
            anyhow::anyhow!("no simulator configured: pass --simulator or set RGTUNE_SIMULATOR")
        })?;
        Ok(CommandSimulator::new(program).with_args(self.args.clone()))
    }
}

/// Runs one external process per batch of games
#[derive(Clone, Debug)]
pub struct CommandSimulator {
    program: PathBuf,
    args: Vec<String>,
    poll_interval: Duration,
}

impl CommandSimulator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            poll_interval: Duration::from_millis(20),
        }
    }

    /// Arguments placed before the agents on every invocation
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn spawn(&self, agent_a: &Path, agent_b: &Path, games: usize, seed: u64) -> Result<Child> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(agent_a)
            .arg(agent_b)
            .arg(games.to_string())
            .arg(seed.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command.spawn().map_err(|e| {
            TuneError::Simulation(format!("failed to start {}: {}", self.program.display(), e))
        })
    }

    /// Wait for a pipe reader and hand back what it read
    fn collect(&self, reader: JoinHandle<io::Result<Vec<u8>>>, stream: &str) -> Result<Vec<u8>> {
        reader
            .join()
            .map_err(|_| {
                TuneError::Simulation(format!(
                    "reader for the {} of {} panicked",
                    stream,
                    self.program.display()
                ))
            })?
            .map_err(|e| {
                TuneError::Simulation(format!(
                    "failed to read the {} of {}: {}",
                    stream,
                    self.program.display(),
                    e
                ))
            })
    }
}

impl Simulator for CommandSimulator {
    fn simulate(
        &self,
        agent_a: &Path,
        agent_b: &Path,
        games: usize,
        seed: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<GameScore>> {
        cancel.check()?;
        let mut child = self.spawn(agent_a, agent_b, games, seed)?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if cancel.is_cancelled() {
                terminate(&mut child);
                return Err(TuneError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    terminate(&mut child);
                    return Err(TuneError::Simulation(format!(
                        "failed to wait for {}: {}",
                        self.program.display(),
                        e
                    )));
                }
            }
        };

        let stdout = self.collect(stdout, "stdout")?;
        let stderr = self.collect(stderr, "stderr")?;

        // A cancel that raced the child's exit still counts as the interrupt.
        cancel.check()?;
        if !status.success() {
            return Err(TuneError::Simulation(format!(
                "{} exited with {}: {}",
                self.program.display(),
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        let stdout = String::from_utf8(stdout).map_err(|e| {
            TuneError::Simulation(format!(
                "{} printed invalid UTF-8: {}",
                self.program.display(),
                e
            ))
        })?;
        let scores = parse_scores(&stdout)?;
        if scores.len() != games {
            return Err(TuneError::Simulation(format!(
                "{} reported {} games, expected {}",
                self.program.display(),
                scores.len(),
                games
            )));
        }
        Ok(scores)
    }
}

/// Parse the simulator's per-game score lines
pub fn parse_scores(output: &str) -> Result<Vec<GameScore>> {
    output
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(index, line)| parse_score_line(index + 1, line))
        .collect()
}

fn parse_score_line(line_number: usize, line: &str) -> Result<GameScore> {
    let fields: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty())
        .collect();

    let invalid = || {
        TuneError::Simulation(format!(
            "line {}: expected two scores, got `{}`",
            line_number, line
        ))
    };
    let score = |field: &str| {
        field
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(invalid)
    };
    match fields.as_slice() {
        [a, b] => Ok(GameScore::new(score(*a)?, score(*b)?)),
        _ => Err(invalid()),
    }
}

/// Read a child's pipe to the end on a helper thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut bytes)?;
        }
        Ok(bytes)
    })
}

/// Kill the child and, on Unix, every process in its group
fn terminate(child: &mut Child) {
    // The group id equals the child's pid. `sh`'s builtin `kill` takes a
    // negative pid as a group on every POSIX shell.
    #[cfg(unix)]
    {
        let _ = Command::new("sh")
            .arg("-c")
            .arg(format!("kill -9 -{}", child.id()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    let _ = child.kill();
    let _ = child.wait();
}
