//! Worker threads for parallel sample assembly.
//!
//! - `pool`: generic thread pool with one task channel per worker
//! - this module: the batch task type and the per-batch work itself
//!
//! Batch `i` of an epoch always goes to worker `i % num_workers`, and each
//! worker seeds its RNG from `(seed, epoch, worker_id)` before its first
//! batch, so a fixed seed and worker count reproduce every augmentation.

pub(crate) mod pool;

use crate::collator::Collator;
use crate::dataloader::common::thread::{init_worker_rng, WORKER_ID};
use crate::dataset::Dataset;
use crate::minibatch::MiniBatch;
use crate::sample::Sample;
use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use pool::WorkerPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One batch of dataset indices, tagged with its position in the epoch.
#[derive(Debug)]
pub(crate) struct BatchTask {
    pub(crate) batch_index: usize,
    pub(crate) indices: Vec<usize>,
}

/// Output of a worker: the batch position and the collated result.
pub(crate) type BatchOutput = (usize, Result<MiniBatch>);

/// Fetches every index from `dataset` and collates the samples.
pub(crate) fn process_batch<D, C>(dataset: &D, indices: &[usize], collator: &C) -> Result<MiniBatch>
where
    D: Dataset + ?Sized,
    C: Collator,
{
    let samples = indices
        .iter()
        .map(|&index| {
            dataset.get(index).with_context(|| {
                format!(
                    "Failed to load sample at index {} (dataset size: {})",
                    index,
                    dataset.len()
                )
            })
        })
        .collect::<Result<Vec<Sample>>>()?;

    collator
        .collate(&samples)
        .with_context(|| format!("Failed to collate batch of {} samples", samples.len()))
}

/// Spawns a pool whose workers serve one epoch.
pub(crate) fn spawn_epoch_pool<D, C>(
    dataset: Arc<D>,
    collator: C,
    num_workers: usize,
    prefetch_factor: usize,
    worker_timeout: Duration,
    epoch: usize,
    seed: u64,
) -> Result<WorkerPool<BatchTask, BatchOutput>>
where
    D: Dataset + 'static,
    C: Collator + Clone + Send + Sync + 'static,
{
    // One extra slot absorbs the task sent while a worker is busy.
    WorkerPool::new(
        num_workers,
        prefetch_factor + 1,
        move |task_rx: Receiver<BatchTask>,
              output_tx: Sender<BatchOutput>,
              shutdown: Arc<AtomicBool>| {
            let worker_id = WORKER_ID.with(|id| *id.borrow());
            init_worker_rng(worker_id, epoch, seed);
            tracing::debug!(worker_id, epoch, "worker started");

            loop {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                let task = match task_rx.recv_timeout(worker_timeout) {
                    Ok(task) => task,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                };

                let result = process_batch(dataset.as_ref(), &task.indices, &collator)
                    .with_context(|| format!("Worker {} failed", worker_id));
                if let Err(err) = &result {
                    tracing::warn!(worker_id, batch = task.batch_index, "batch failed: {err:#}");
                }
                if output_tx.send((task.batch_index, result)).is_err() {
                    break;
                }
            }
        },
    )
}
