//! Variant generation - rewriting the tuned constant in an agent's source
//!
//! Level 2 - materialize (phase)
//! Level 3 - patch_constant, parse_constant (steps)
//!
//! The authoritative assignment is the first line that mentions the
//! constant's name. That line must contain `=`; everything after the first
//! `=` is the value.

use std::fs;
use std::path::{Path, PathBuf};

use crate::candidate::Candidate;
use crate::error::{Result, TuneError};

/// The constant being tuned and the agent source it lives in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstantSpec {
    /// Identifier of the constant, e.g. `ATTACK_THRESHOLD`
    pub name: String,
    /// Base agent artifact holding the authoritative assignment
    pub artifact: PathBuf,
}

impl ConstantSpec {
    pub fn new(name: impl Into<String>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            artifact: artifact.into(),
        }
    }

    /// Directory candidates are written to when none is configured
    pub fn default_work_dir(&self) -> PathBuf {
        match self.artifact.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

// ============================================================================
// Level 2 - Phases
// ============================================================================

/// Write one artifact per value, each a copy of the base artifact with the
/// constant rewritten.
///
/// The returned candidates own their files. If any value fails, the
/// artifacts written so far are removed before the error is returned.
pub fn materialize(spec: &ConstantSpec, values: &[f64], work_dir: &Path) -> Result<Vec<Candidate>> {
    let base = read_artifact(&spec.artifact)?;
    values
        .iter()
        .map(|&value| write_variant(spec, &base, value, work_dir))
        .collect()
}

/// Write a single variant artifact
pub fn materialize_one(spec: &ConstantSpec, value: f64, work_dir: &Path) -> Result<Candidate> {
    let base = read_artifact(&spec.artifact)?;
    write_variant(spec, &base, value, work_dir)
}

/// Read the constant's current value from its artifact
pub fn get_current_value(spec: &ConstantSpec) -> Result<f64> {
    let text = read_artifact(&spec.artifact)?;
    parse_constant(&spec.name, &spec.artifact, &text)
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Patch `base` and write it to the variant's location
fn write_variant(spec: &ConstantSpec, base: &str, value: f64, work_dir: &Path) -> Result<Candidate> {
    let text = patch_constant(&spec.name, &spec.artifact, base, value)?;
    let candidate = Candidate::new(value, variant_path(spec, value, work_dir));
    fs::write(candidate.path(), text).map_err(|e| TuneError::io(candidate.path(), e))?;
    tracing::debug!("materialized {} = {} at {}", spec.name, value, candidate.path().display());
    Ok(candidate)
}

/// Rewrite the right-hand side of the constant's assignment in `text`.
///
/// Only the located line changes. Its left-hand side (up to the first `=`,
/// trailing whitespace trimmed) is kept and the value is written with
/// [`format_value`]. Line terminators are preserved.
///
/// `artifact` is used for error reporting only.
pub fn patch_constant(name: &str, artifact: &Path, text: &str, value: f64) -> Result<String> {
    let mut out = String::with_capacity(text.len() + 16);
    let mut patched = false;

    for (index, raw) in text.split_inclusive('\n').enumerate() {
        if patched || !raw.contains(name) {
            out.push_str(raw);
            continue;
        }

        let (body, ending) = split_line_ending(raw);
        let eq = body
            .find('=')
            .ok_or_else(|| malformed(name, artifact, index))?;

        out.push_str(body[..eq].trim_end());
        out.push_str(" = ");
        out.push_str(&format_value(value));
        out.push_str(ending);
        patched = true;
    }

    if !patched {
        return Err(not_found(name, artifact));
    }
    Ok(out)
}

/// Parse the value assigned to the constant in `text`.
///
/// The value must be a finite number.
pub fn parse_constant(name: &str, artifact: &Path, text: &str) -> Result<f64> {
    let (index, line) = text
        .lines()
        .enumerate()
        .find(|(_, line)| line.contains(name))
        .ok_or_else(|| not_found(name, artifact))?;

    let eq = line.find('=').ok_or_else(|| malformed(name, artifact, index))?;
    let rhs = line[eq + 1..].trim();

    rhs.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| TuneError::InvalidValue {
            name: name.to_string(),
            artifact: artifact.to_path_buf(),
            text: rhs.to_string(),
        })
}

// ============================================================================
// Level 4 - Utilities
// ============================================================================

/// Textual form of a value inside an artifact and its file name.
///
/// Shortest representation that parses back to the same `f64`, so `1.0`
/// is written `1` and `2.5` stays `2.5`.
pub fn format_value(value: f64) -> String {
    format!("{}", value)
}

/// Deterministic artifact location for `value`:
/// `<work_dir>/<stem>_<NAME>_<value>[.<ext>]`
pub fn variant_path(spec: &ConstantSpec, value: f64, work_dir: &Path) -> PathBuf {
    let stem = spec
        .artifact
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "agent".to_string());

    let mut file_name = format!("{}_{}_{}", stem, spec.name, format_value(value));
    if let Some(ext) = spec.artifact.extension() {
        file_name.push('.');
        file_name.push_str(&ext.to_string_lossy());
    }
    work_dir.join(file_name)
}

fn read_artifact(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| TuneError::io(path, e))
}

fn split_line_ending(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, "\n")
    } else {
        (raw, "")
    }
}

fn not_found(name: &str, artifact: &Path) -> TuneError {
    TuneError::ConstantNotFound {
        name: name.to_string(),
        artifact: artifact.to_path_buf(),
    }
}

fn malformed(name: &str, artifact: &Path, index: usize) -> TuneError {
    TuneError::MalformedAssignment {
        name: name.to_string(),
        artifact: artifact.to_path_buf(),
        line: index + 1,
    }
}
