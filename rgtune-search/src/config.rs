//! Search configuration
//!
//! Level 4 - Configuration

use std::path::PathBuf;

/// Configuration for one coordinate search
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Initial step size
    pub precision: f64,
    /// The search stops once the step size drops below this
    pub floor: f64,
    /// Where candidate artifacts are written (None = next to the base artifact)
    pub work_dir: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            precision: 8.0,
            floor: 0.1,
            work_dir: None,
        }
    }
}

impl SearchConfig {
    /// Create config with the given initial step size
    pub fn new(precision: f64) -> Self {
        Self {
            precision,
            ..Default::default()
        }
    }

    /// Set the step size the search stops below
    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    /// Write candidate artifacts to `dir`
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }
}
