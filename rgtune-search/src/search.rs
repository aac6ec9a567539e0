//! Coordinate search - the outer tuning loop
//!
//! Level 1 - Orchestration, Level 2 - Phases, Level 3 - Steps

use std::path::{Path, PathBuf};

use serde::Serialize;

use rgtune_core::{
    format_value, get_current_value, materialize, materialize_one, Candidate, ConstantSpec,
    Result, Simulator, TuneError,
};
use rgtune_tournament::{Entrants, Evaluator, PairScoreCache};

use crate::config::SearchConfig;

/// What an iteration did with the search state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// A neighbour won; the base value moved to it, step size unchanged
    Moved,
    /// The base value held; the step size was halved
    Refined,
}

/// Summary of one iteration, handed to the progress callback
#[derive(Clone, Debug, Serialize)]
pub struct IterationReport {
    pub iteration: usize,
    /// Base value the iteration started from
    pub base_value: f64,
    /// Step size used by the iteration
    pub precision: f64,
    pub winner_value: f64,
    pub winner_total: f64,
    /// Whether the winner came out of a tie-break
    pub tie_broken: bool,
    pub step: Step,
}

/// Result of a completed search
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    pub constant: String,
    pub initial_value: f64,
    /// Value committed to the base artifact
    pub final_value: f64,
    /// Step size the search stopped at
    pub final_precision: f64,
    pub iterations: usize,
    pub history: Vec<IterationReport>,
}

/// Search state carried from one iteration to the next
struct SearchState {
    base_value: f64,
    precision: f64,
    /// Winner of the previous iteration, reused as the next stand-pat candidate
    leader: Option<Candidate>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Tune `spec`'s constant against `opponents` and commit the result
pub fn optimize<S: Simulator>(
    evaluator: &mut Evaluator<S>,
    spec: &ConstantSpec,
    opponents: &[PathBuf],
    config: &SearchConfig,
) -> Result<SearchResult> {
    optimize_with_callback(evaluator, spec, opponents, config, |_| {})
}

/// Tune `spec`'s constant, reporting every iteration to `callback`.
///
/// Reads like a table of contents:
/// 1. Read the current value
/// 2. Run tournaments until the step size drops below the floor
/// 3. Commit the final value over the base artifact
///
/// Nothing is committed when an error or interrupt ends the search early,
/// and every candidate artifact written along the way is removed.
pub fn optimize_with_callback<S, C>(
    evaluator: &mut Evaluator<S>,
    spec: &ConstantSpec,
    opponents: &[PathBuf],
    config: &SearchConfig,
    mut callback: C,
) -> Result<SearchResult>
where
    S: Simulator,
    C: FnMut(&IterationReport),
{
    validate(config, opponents)?;
    let work_dir = config
        .work_dir
        .clone()
        .unwrap_or_else(|| spec.default_work_dir());

    let initial_value = get_current_value(spec)?;
    let mut state = SearchState {
        base_value: initial_value,
        precision: config.precision,
        leader: None,
    };
    let mut cache = PairScoreCache::new();
    let mut history = Vec::new();

    while state.precision >= config.floor {
        let report = run_iteration(
            evaluator,
            spec,
            opponents,
            &work_dir,
            &mut state,
            &mut cache,
            history.len(),
        )?;
        callback(&report);
        history.push(report);
    }

    evaluator.cancel_token().check()?;
    commit(spec, state.base_value, state.leader.take(), &work_dir)?;

    Ok(SearchResult {
        constant: spec.name.clone(),
        initial_value,
        final_value: state.base_value,
        final_precision: state.precision,
        iterations: history.len(),
        history,
    })
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play one tournament around the base value and update the search state
fn run_iteration<S: Simulator>(
    evaluator: &mut Evaluator<S>,
    spec: &ConstantSpec,
    opponents: &[PathBuf],
    work_dir: &Path,
    state: &mut SearchState,
    cache: &mut PairScoreCache,
    iteration: usize,
) -> Result<IterationReport> {
    evaluator.cancel_token().check()?;
    let (base_value, precision) = (state.base_value, state.precision);
    tracing::info!(
        "running with base value {} precision {}",
        format_value(base_value),
        precision
    );

    let entrants = build_entrants(spec, base_value, precision, state.leader.take(), work_dir)?;
    let result = evaluator.run_tournament(opponents, entrants, cache)?;

    let winner_value = result.winner.value();
    let step = if winner_value == base_value {
        state.precision /= 2.0;
        tracing::info!(
            "best value remains {}, decreasing precision to {}",
            format_value(winner_value),
            state.precision
        );
        Step::Refined
    } else {
        state.base_value = winner_value;
        tracing::info!("new best value is {}", format_value(winner_value));
        Step::Moved
    };

    let report = IterationReport {
        iteration,
        base_value,
        precision,
        winner_value,
        winner_total: result.winner_total(),
        tie_broken: result.tie_break.is_some(),
        step,
    };
    state.leader = Some(result.winner);

    Ok(report)
}

/// Write the final value over the base artifact.
///
/// The last winner already carries the final value and is moved into
/// place; a fresh artifact is only written when no iteration ran.
fn commit(
    spec: &ConstantSpec,
    base_value: f64,
    leader: Option<Candidate>,
    work_dir: &Path,
) -> Result<()> {
    let final_artifact = match leader.filter(|c| c.value() == base_value) {
        Some(candidate) => candidate,
        None => materialize_one(spec, base_value, work_dir)?,
    };
    final_artifact.persist_to(&spec.artifact)?;

    tracing::info!(
        "wrote {} = {} to {}",
        spec.name,
        format_value(base_value),
        spec.artifact.display()
    );
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Candidates for one iteration: one step down, one step up, and standing
/// pat. The previous winner is reused as the stand-pat candidate when it
/// carries the base value.
///
/// A step too small to change the base value in `f64` yields no neighbour,
/// so every candidate owns a distinct artifact.
fn build_entrants(
    spec: &ConstantSpec,
    base_value: f64,
    precision: f64,
    leader: Option<Candidate>,
    work_dir: &Path,
) -> Result<Entrants> {
    let stand_pat = leader.filter(|c| c.value() == base_value);

    let mut values: Vec<f64> = [base_value - precision, base_value + precision]
        .into_iter()
        .filter(|&value| value != base_value)
        .collect();
    if values.is_empty() {
        tracing::debug!(
            "step {} does not move {}, standing pat",
            precision,
            format_value(base_value)
        );
    }
    if stand_pat.is_none() {
        values.push(base_value);
    }

    let mut candidates = materialize(spec, &values, work_dir)?;
    candidates.extend(stand_pat);
    let incumbent = candidates.len() - 1;

    Ok(Entrants::new(candidates).with_incumbent(incumbent))
}

fn validate(config: &SearchConfig, opponents: &[PathBuf]) -> Result<()> {
    if opponents.is_empty() {
        return Err(TuneError::InvalidConfig(
            "at least one opponent is required".to_string(),
        ));
    }
    if !(config.precision.is_finite() && config.precision > 0.0) {
        return Err(TuneError::InvalidConfig(format!(
            "precision must be a positive number, got {}",
            config.precision
        )));
    }
    if !(config.floor.is_finite() && config.floor > 0.0) {
        return Err(TuneError::InvalidConfig(format!(
            "precision floor must be a positive number, got {}",
            config.floor
        )));
    }
    Ok(())
}
