//! Bounded worker pool with channel fan-in
//!
//! Every submitted unit runs to completion on its own task; a failing or
//! panicking unit never stops its siblings. Results are gathered through a
//! channel and returned in submission order once all workers have finished.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Caps how many units run at once
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool running at most `max_workers` units at a time (minimum 1)
    pub fn new(max_workers: usize) -> Self {
        let size = max_workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `work` for every unit and wait for all of them
    ///
    /// The second element is `None` when the worker died before reporting.
    pub async fn run_all<K, T, F, Fut>(&self, units: Vec<K>, work: F) -> Vec<(K, Option<T>)>
    where
        K: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(K) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, T)>();
        let mut workers = Vec::with_capacity(units.len());

        for (index, unit) in units.iter().cloned().enumerate() {
            let permits = Arc::clone(&self.permits);
            let tx = tx.clone();
            let job = work(unit);

            workers.push(tokio::spawn(async move {
                // the semaphore is never closed
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                let result = job.await;
                let _ = tx.send((index, result));
            }));
        }
        drop(tx);

        let mut results: Vec<Option<T>> = units.iter().map(|_| None).collect();
        while let Some((index, result)) = rx.recv().await {
            results[index] = Some(result);
        }

        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "setup worker terminated abnormally");
            }
        }

        units.into_iter().zip(results).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_follow_submission_order() {
        let pool = WorkerPool::new(4);
        let results = pool
            .run_all(vec![30u64, 10, 20], |delay| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay * 2
            })
            .await;

        assert_eq!(results, vec![(30, Some(60)), (10, Some(20)), (20, Some(40))]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = pool
            .run_all((0..8).collect::<Vec<u32>>(), |_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await;

        assert_eq!(results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panicking_unit_does_not_stop_siblings() {
        let pool = WorkerPool::new(3);
        let results = pool
            .run_all(vec![1u32, 2, 3], |unit| async move {
                if unit == 2 {
                    panic!("unit {unit} blew up");
                }
                unit
            })
            .await;

        assert_eq!(results, vec![(1, Some(1)), (2, None), (3, Some(3))]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.size(), 1);
        let results: Vec<(u32, Option<u32>)> = pool.run_all(Vec::new(), |u| async move { u }).await;
        assert!(results.is_empty());
    }
}
