//! Opponent score cache
//!
//! Level 4 - Utilities

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

/// Aggregate differentials of candidates against opponents, keyed by
/// (opponent, candidate) artifact paths.
///
/// Candidate paths are derived from the constant's value, so a value that
/// comes up again in a later tournament reuses its earlier score. Zero is
/// never a valid score here: it reads back as absent.
#[derive(Clone, Debug, Default)]
pub struct PairScoreCache {
    scores: FxHashMap<(PathBuf, PathBuf), f64>,
}

impl PairScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Previously recorded nonzero score of `candidate` against `opponent`
    pub fn get(&self, opponent: &Path, candidate: &Path) -> Option<f64> {
        self.scores
            .get(&(opponent.to_path_buf(), candidate.to_path_buf()))
            .copied()
            .filter(|&score| score != 0.0)
    }

    /// Record a score. Recording zero forgets the pair instead.
    pub fn insert(&mut self, opponent: &Path, candidate: &Path, score: f64) {
        let key = (opponent.to_path_buf(), candidate.to_path_buf());
        if score == 0.0 {
            self.scores.remove(&key);
        } else {
            self.scores.insert(key, score);
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut cache = PairScoreCache::new();
        cache.insert(Path::new("enemy.py"), Path::new("bot_X_2.py"), 14.0);

        assert_eq!(cache.get(Path::new("enemy.py"), Path::new("bot_X_2.py")), Some(14.0));
        assert_eq!(cache.get(Path::new("bot_X_2.py"), Path::new("enemy.py")), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_reads_as_unset() {
        let mut cache = PairScoreCache::new();
        cache.insert(Path::new("enemy.py"), Path::new("bot_X_2.py"), -3.0);
        cache.insert(Path::new("enemy.py"), Path::new("bot_X_2.py"), 0.0);

        assert_eq!(cache.get(Path::new("enemy.py"), Path::new("bot_X_2.py")), None);
        assert!(cache.is_empty());
    }
}
