//! Candidate artifacts
//!
//! A `Candidate` owns the file it was materialized into. Dropping it deletes
//! the file, so every exit path (success, error or interrupt) cleans up
//! whatever has not been committed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, TuneError};

/// One trial value of the constant together with its runnable artifact
#[derive(Debug)]
pub struct Candidate {
    value: f64,
    path: PathBuf,
    armed: bool,
}

impl Candidate {
    /// Take ownership of the artifact at `path`; it is deleted on drop
    pub fn new(value: f64, path: impl Into<PathBuf>) -> Self {
        Self {
            value,
            path: path.into(),
            armed: true,
        }
    }

    /// The constant value this artifact carries
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Location of the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the artifact over `dest`, replacing it.
    ///
    /// `dest` is only ever replaced whole: when a plain rename is not
    /// possible the contents are staged next to `dest` first.
    pub fn persist_to(mut self, dest: &Path) -> Result<()> {
        if fs::rename(&self.path, dest).is_err() {
            let staged = staging_path(dest);
            fs::copy(&self.path, &staged).map_err(|e| TuneError::io(&staged, e))?;
            if let Err(e) = fs::rename(&staged, dest) {
                let _ = fs::remove_file(&staged);
                return Err(TuneError::io(dest, e));
            }
            let _ = fs::remove_file(&self.path);
        }
        self.armed = false;
        Ok(())
    }

    /// Release ownership without deleting the artifact
    pub fn into_path(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for Candidate {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::info!("removing {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Sibling of `dest` used to stage a copy before renaming it into place
fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".rgtune-tmp");
    dest.with_file_name(name)
}
