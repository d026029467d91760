//! Bounded pool for blocking model work.
//!
//! Model loads and forward passes are CPU/GPU bound and must not run on the
//! async executor. Every job goes through [`InferencePool::run`], which waits
//! for a permit and then moves the job onto tokio's blocking threads.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::{ModelError, Result};

#[derive(Debug, Clone)]
pub struct InferencePool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl InferencePool {
    /// Pool allowing at most `workers` concurrent jobs (minimum 1).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Permits not currently held by a running job.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on the blocking pool once a permit is free.
    ///
    /// The permit travels with the job, so it stays held until the blocking
    /// work finishes even if the awaiting future is dropped.
    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| ModelError::Worker(e.to_string()))?;
        debug!(available = self.permits.available_permits(), "Inference permit acquired");

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await?
    }
}

impl Default for InferencePool {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_job_result() {
        let pool = InferencePool::new(2);
        let value = pool.run(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_job_error_propagates() {
        let pool = InferencePool::new(1);
        let err = pool
            .run(|| Err::<(), _>(ModelError::Inference("boom".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Inference(_)));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let pool = InferencePool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let pool = pool.clone();
            let running = running.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                pool.run(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_zero_workers_rounds_up() {
        assert_eq!(InferencePool::new(0).workers(), 1);
    }
}
