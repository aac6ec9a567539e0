//! Error taxonomy shared by every rgtune crate
//!
//! Level 4 - Utilities

use std::path::PathBuf;

/// Result alias used throughout the library crates
pub type Result<T> = std::result::Result<T, TuneError>;

/// Errors raised while tuning a constant
#[derive(Debug, thiserror::Error)]
pub enum TuneError {
    #[error("constant `{name}` not found in {}", artifact.display())]
    ConstantNotFound { name: String, artifact: PathBuf },

    #[error("line {line} of {} mentions `{name}` but has no `=` assignment", artifact.display())]
    MalformedAssignment {
        name: String,
        artifact: PathBuf,
        line: usize,
    },

    #[error("value `{text}` assigned to `{name}` in {} is not a number", artifact.display())]
    InvalidValue {
        name: String,
        artifact: PathBuf,
        text: String,
    },

    #[error("simulation failed: {0}")]
    Simulation(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("interrupted")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TuneError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TuneError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the interrupt condition
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TuneError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_constant() {
        let err = TuneError::ConstantNotFound {
            name: "ATTACK".to_string(),
            artifact: PathBuf::from("bot.py"),
        };
        assert_eq!(err.to_string(), "constant `ATTACK` not found in bot.py");

        let err = TuneError::MalformedAssignment {
            name: "ATTACK".to_string(),
            artifact: PathBuf::from("bot.py"),
            line: 4,
        };
        assert!(err.to_string().contains("line 4"));
    }

    #[test]
    fn test_is_cancelled() {
        assert!(TuneError::Cancelled.is_cancelled());
        assert!(!TuneError::Simulation("boom".into()).is_cancelled());
    }
}
