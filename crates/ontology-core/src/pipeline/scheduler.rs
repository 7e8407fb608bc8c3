//! Fixed-size worker pool for per-file jobs.
//!
//! Items are split into contiguous chunks, one OS thread per chunk. Each
//! thread fills a private buffer that is handed back through its join
//! handle; nothing is shared between workers except the job itself.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use crate::config::{ParallelConfig, PROGRESS_INTERVAL};

/// The results of one worker's chunk.
#[derive(Debug)]
pub struct ChunkReport<R> {
    pub chunk: usize,
    pub results: Vec<R>,
}

/// Everything a run produced, in item order.
#[derive(Debug)]
pub struct Batch<R> {
    pub results: Vec<R>,
    /// Items lost because their worker panicked.
    pub dropped: usize,
    pub dropped_chunks: Vec<usize>,
}

impl<R> Batch<R> {
    fn empty() -> Self {
        Self {
            results: Vec::new(),
            dropped: 0,
            dropped_chunks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    workers: usize,
    min_files: usize,
    enabled: bool,
}

impl Scheduler {
    pub fn new(config: &ParallelConfig) -> Self {
        Self {
            workers: config.worker_count(),
            min_files: config.min_files,
            enabled: config.enabled,
        }
    }

    /// A scheduler that never spawns threads.
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            min_files: usize::MAX,
            enabled: false,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_parallel_for(&self, items: usize) -> bool {
        self.enabled && self.workers > 1 && items >= self.min_files
    }

    /// Apply `job` to every item.
    ///
    /// Results keep item order. A worker that panics loses its whole chunk;
    /// the other chunks are still returned.
    pub fn run<T, R, F>(&self, label: &str, items: Vec<T>, job: F) -> Batch<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        if items.is_empty() {
            return Batch::empty();
        }
        if !self.is_parallel_for(items.len()) {
            return self.run_sequential(label, items, job);
        }
        self.run_parallel(label, items, job)
    }

    fn run_sequential<T, R, F>(&self, label: &str, items: Vec<T>, job: F) -> Batch<R>
    where
        F: Fn(T) -> R,
    {
        let total = items.len();
        let mut batch = Batch::empty();
        for (i, item) in items.into_iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| job(item))) {
                Ok(result) => batch.results.push(result),
                Err(_) => {
                    warn!(label, item = i, "Job panicked, item dropped");
                    batch.dropped += 1;
                }
            }
            let done = i + 1;
            if done % PROGRESS_INTERVAL == 0 || done == total {
                debug!(label, done, total, "Progress");
            }
        }
        batch
    }

    fn run_parallel<T, R, F>(&self, label: &str, items: Vec<T>, job: F) -> Batch<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let total = items.len();
        let chunk_size = total.div_ceil(self.workers);
        let job = Arc::new(job);

        let mut chunks: Vec<Vec<T>> = Vec::with_capacity(self.workers);
        let mut items = items.into_iter();
        loop {
            let chunk: Vec<T> = items.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            chunks.push(chunk);
        }

        debug!(label, total, workers = chunks.len(), chunk_size, "Dispatching to worker pool");

        let mut handles = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.into_iter().enumerate() {
            let len = chunk.len();
            let job = Arc::clone(&job);
            let spawned = thread::Builder::new()
                .name(format!("{}-worker-{}", label, index))
                .spawn(move || ChunkReport {
                    chunk: index,
                    results: chunk.into_iter().map(|item| job(item)).collect(),
                });
            handles.push((index, len, spawned));
        }

        let mut batch = Batch::empty();
        for (index, len, spawned) in handles {
            let joined = match spawned {
                Ok(handle) => handle.join().map_err(|_| "worker panicked".to_string()),
                Err(e) => Err(format!("spawn failed: {}", e)),
            };
            match joined {
                Ok(report) => batch.results.extend(report.results),
                Err(reason) => {
                    warn!(label, chunk = index, files = len, %reason, "Worker chunk dropped");
                    batch.dropped += len;
                    batch.dropped_chunks.push(index);
                }
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parallel(workers: usize, min_files: usize) -> Scheduler {
        Scheduler::new(&ParallelConfig {
            enabled: true,
            workers: Some(workers),
            min_files,
        })
    }

    #[test]
    fn test_parallel_keeps_order() {
        let scheduler = parallel(4, 1);
        let items: Vec<usize> = (0..103).collect();
        let batch = scheduler.run("test", items, |n| n * 2);

        assert_eq!(batch.dropped, 0);
        assert_eq!(batch.results, (0..103).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_panicking_worker_drops_its_chunk() {
        let scheduler = parallel(4, 1);
        let items: Vec<usize> = (0..8).collect();
        let batch = scheduler.run("test", items, |n| {
            if n == 5 {
                panic!("boom");
            }
            n
        });

        // Chunks of two: [0,1] [2,3] [4,5] [6,7]
        assert_eq!(batch.results, vec![0, 1, 2, 3, 6, 7]);
        assert_eq!(batch.dropped, 2);
        assert_eq!(batch.dropped_chunks, vec![2]);
    }

    #[test]
    fn test_below_threshold_runs_sequentially() {
        let scheduler = parallel(4, 100);
        assert!(!scheduler.is_parallel_for(10));
        assert!(scheduler.is_parallel_for(100));

        let main = thread::current().id();
        let batch = scheduler.run("test", vec![1, 2, 3], move |n| {
            assert_eq!(thread::current().id(), main);
            n + 1
        });
        assert_eq!(batch.results, vec![2, 3, 4]);
    }

    #[test]
    fn test_sequential_never_parallel() {
        let scheduler = Scheduler::sequential();
        assert!(!scheduler.is_parallel_for(1_000_000));
        let batch: Batch<u8> = scheduler.run("test", Vec::<u8>::new(), |n| n);
        assert!(batch.results.is_empty());
    }
}
