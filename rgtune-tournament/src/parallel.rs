//! Fixed-size worker pool with an unordered parallel reduce
//!
//! Level 4 - Utilities

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use rgtune_core::{CancelToken, Result, TuneError};

/// A fixed number of worker threads that independent tasks fan out to
pub struct WorkerPool {
    pool: ThreadPool,
    size: usize,
}

impl WorkerPool {
    /// Create a pool with `size` worker threads
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(TuneError::InvalidConfig(
                "worker pool needs at least one worker".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("rgtune-worker-{}", i))
            .build()
            .map_err(|e| TuneError::InvalidConfig(format!("failed to start worker pool: {}", e)))?;

        Ok(Self { pool, size })
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `task` over every item in parallel and sum the results.
    ///
    /// Results are combined in completion order. The first error stops
    /// further tasks from being scheduled and is returned; tasks that have
    /// not started yet are skipped once `cancel` fires.
    pub fn try_sum<T, F>(&self, items: &[T], cancel: &CancelToken, task: F) -> Result<f64>
    where
        T: Sync,
        F: Fn(&T) -> Result<f64> + Sync + Send,
    {
        self.pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    cancel.check()?;
                    task(item)
                })
                .try_reduce(|| 0.0, |a, b| Ok(a + b))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_pool_rejects_zero_workers() {
        assert!(matches!(WorkerPool::new(0), Err(TuneError::InvalidConfig(_))));
    }

    #[test]
    fn test_try_sum() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.size(), 3);

        let items: Vec<u32> = (1..=10).collect();
        let total = pool
            .try_sum(&items, &CancelToken::new(), |&n| Ok(n as f64))
            .unwrap();
        assert_eq!(total, 55.0);
    }

    #[test]
    fn test_try_sum_empty() {
        let pool = WorkerPool::new(2).unwrap();
        let items: Vec<u32> = Vec::new();
        assert_eq!(pool.try_sum(&items, &CancelToken::new(), |_| Ok(1.0)).unwrap(), 0.0);
    }

    #[test]
    fn test_try_sum_propagates_error() {
        let pool = WorkerPool::new(2).unwrap();
        let items: Vec<u32> = (0..8).collect();
        let result = pool.try_sum(&items, &CancelToken::new(), |&n| {
            if n == 5 {
                Err(TuneError::Simulation("engine crashed".to_string()))
            } else {
                Ok(1.0)
            }
        });
        assert!(matches!(result, Err(TuneError::Simulation(_))));
    }

    #[test]
    fn test_try_sum_skips_tasks_after_cancel() {
        let pool = WorkerPool::new(2).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let started = AtomicUsize::new(0);
        let items: Vec<u32> = (0..8).collect();
        let result = pool.try_sum(&items, &cancel, |_| {
            started.fetch_add(1, Ordering::SeqCst);
            Ok(1.0)
        });

        assert!(matches!(result, Err(TuneError::Cancelled)));
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }
}
