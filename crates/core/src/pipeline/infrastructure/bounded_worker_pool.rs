use std::thread;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkerPoolError {
    #[error("{count} worker thread(s) panicked")]
    WorkerPanicked { count: usize },
    #[error("job queue closed before all work was queued")]
    QueueClosed,
}

/// Fixed-size scoped thread pool for one parallel phase.
///
/// Layout: `queue → N workers → results`. `map` returns only after every
/// worker has drained the queue and exited, which is the phase barrier.
/// Worker count affects latency only, never the result.
pub struct BoundedWorkerPool {
    max_workers: usize,
}

impl BoundedWorkerPool {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Applies `task` to every item and returns the results in input order.
    ///
    /// Tasks are expected to absorb their own failures. A panicking task
    /// is a bug and fails the whole phase once all workers have stopped.
    pub fn map<T, R, F>(&self, items: Vec<T>, task: F) -> Result<Vec<R>, WorkerPoolError>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let workers = self.max_workers.min(total);

        let (job_tx, job_rx) = crossbeam_channel::bounded::<(usize, T)>(total);
        for job in items.into_iter().enumerate() {
            job_tx
                .send(job)
                .map_err(|_| WorkerPoolError::QueueClosed)?;
        }
        drop(job_tx);

        let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, R)>();
        let task = &task;

        let panicked = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        for (idx, item) in job_rx {
                            if result_tx.send((idx, task(item))).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join())
                .filter(|joined| joined.is_err())
                .count()
        });
        drop(result_tx);

        if panicked > 0 {
            return Err(WorkerPoolError::WorkerPanicked { count: panicked });
        }

        let mut results: Vec<(usize, R)> = result_rx.into_iter().collect();
        results.sort_by_key(|(idx, _)| *idx);
        Ok(results.into_iter().map(|(_, r)| r).collect())
    }
}
