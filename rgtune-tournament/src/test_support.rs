//! Simulator doubles for unit tests

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rgtune_core::{CancelToken, GameScore, Result, Simulator, TuneError};

/// Every game ends with the per-game differential computed by a closure
pub struct FnSimulator<F> {
    per_game: F,
}

impl<F> FnSimulator<F>
where
    F: Fn(&Path, &Path) -> f64 + Send + Sync,
{
    pub fn new(per_game: F) -> Self {
        Self { per_game }
    }
}

impl<F> Simulator for FnSimulator<F>
where
    F: Fn(&Path, &Path) -> f64 + Send + Sync,
{
    fn simulate(
        &self,
        agent_a: &Path,
        agent_b: &Path,
        games: usize,
        _seed: u64,
        cancel: &CancelToken,
    ) -> Result<Vec<GameScore>> {
        cancel.check()?;
        let diff = (self.per_game)(agent_a, agent_b);
        Ok(vec![GameScore::new(diff, 0.0); games])
    }
}

/// Returns a scripted batch total per call and records every call
#[derive(Default)]
pub struct ScriptedSimulator {
    totals: Mutex<VecDeque<f64>>,
    calls: Mutex<Vec<(PathBuf, PathBuf, usize, u64)>>,
}

impl ScriptedSimulator {
    pub fn new(totals: &[f64]) -> Self {
        Self {
            totals: Mutex::new(totals.iter().copied().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf, usize, u64)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Simulator for ScriptedSimulator {
    fn simulate(
        &self,
        agent_a: &Path,
        agent_b: &Path,
        games: usize,
        seed: u64,
        _cancel: &CancelToken,
    ) -> Result<Vec<GameScore>> {
        self.calls
            .lock()
            .unwrap()
            .push((agent_a.to_path_buf(), agent_b.to_path_buf(), games, seed));
        let total = self
            .totals
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TuneError::Simulation("script exhausted".to_string()))?;

        let mut scores = vec![GameScore::new(0.0, 0.0); games];
        scores[0] = GameScore::new(total, 0.0);
        Ok(scores)
    }
}

/// Write an agent file assigning `X`
pub fn agent(dir: &Path, name: &str, x: f64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("X = {}\n", x)).unwrap();
    path
}

/// Value of `X` in an agent file, 0 for agents without one
pub fn x_of(path: &Path) -> f64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|text| rgtune_core::parse_constant("X", path, &text).ok())
        .unwrap_or(0.0)
}
