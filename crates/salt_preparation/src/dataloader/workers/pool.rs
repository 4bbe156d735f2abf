//! Thread pool used by the loader's worker mode.
//!
//! Each worker owns a bounded task channel, so the main thread decides
//! which worker handles which task. All workers share one bounded output
//! channel. Dropping the pool raises the shutdown flag, closes the task
//! channels and joins every thread.

use anyhow::{anyhow, ensure, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::dataloader::common::thread::WORKER_ID;

/// # Type Parameters
/// - `Task`: work items sent to workers
/// - `Output`: results returned from workers
pub(crate) struct WorkerPool<Task, Output> {
    workers: Vec<thread::JoinHandle<()>>,
    task_txs: Vec<Sender<Task>>,
    pub(crate) output_rx: Receiver<Output>,
    shutdown: Arc<AtomicBool>,
}

impl<Task, Output> WorkerPool<Task, Output>
where
    Task: Send + 'static,
    Output: Send + 'static,
{
    /// Spawns `num_workers` threads running `worker_fn`, each with a task
    /// queue of `buffer_size`.
    pub(crate) fn new<F>(num_workers: usize, buffer_size: usize, worker_fn: F) -> Result<Self>
    where
        F: Fn(Receiver<Task>, Sender<Output>, Arc<AtomicBool>) + Send + Sync + 'static,
    {
        ensure!(
            num_workers > 0,
            "Cannot create WorkerPool with 0 workers. \
            Either set num_workers > 0 or use single-threaded mode."
        );
        ensure!(
            buffer_size > 0,
            "Cannot create WorkerPool with buffer_size 0. \
            Buffer size must be > 0 to prevent deadlocks."
        );

        let (task_txs, task_rxs): (Vec<_>, Vec<_>) =
            (0..num_workers).map(|_| bounded(buffer_size)).unzip();
        let (output_tx, output_rx) = bounded(buffer_size * num_workers);

        let shutdown = Arc::new(AtomicBool::new(false));
        let worker_fn = Arc::new(worker_fn);
        let mut workers = Vec::with_capacity(num_workers);

        for (worker_id, task_rx) in task_rxs.into_iter().enumerate() {
            let output_tx = output_tx.clone();
            let shutdown = shutdown.clone();
            let worker_fn = worker_fn.clone();

            let handle = thread::Builder::new()
                .name(format!("dataloader-worker-{}", worker_id))
                .spawn(move || {
                    WORKER_ID.with(|id| *id.borrow_mut() = worker_id);
                    worker_fn(task_rx, output_tx, shutdown);
                })
                .with_context(|| format!("Failed to spawn worker thread {}", worker_id))?;

            workers.push(handle);
        }

        Ok(Self {
            workers,
            task_txs,
            output_rx,
            shutdown,
        })
    }

    pub(crate) fn num_workers(&self) -> usize {
        self.task_txs.len()
    }

    /// Blocks until `worker_id`'s queue accepts `task`.
    pub(crate) fn send_to(&self, worker_id: usize, task: Task) -> Result<()> {
        self.task_txs
            .get(worker_id)
            .ok_or_else(|| anyhow!("No worker with id {}", worker_id))?
            .send(task)
            .map_err(|_| anyhow!("Worker {} channel closed", worker_id))
    }
}

impl<Task, Output> Drop for WorkerPool<Task, Output> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.task_txs.clear();

        // Unblock workers stuck on a full output channel.
        while self.output_rx.try_recv().is_ok() {}

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
