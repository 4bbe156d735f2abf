//! src/dataloader/iterator.rs
//!
//! Per-epoch batch iterator.
//!
//! Without workers, batches are assembled on the calling thread with an
//! RNG seeded as worker 0 and owned by the iterator. It is swapped into the
//! thread's worker slot for one batch at a time, so loaders stepped on the
//! same thread never share a stream.
//!
//! With workers, a fresh pool is spawned for the epoch, at most
//! `num_workers * prefetch_factor` batches are in flight, and results are
//! reordered so batches come out in sampler order.

use crate::collator::Collator;
use crate::dataloader::common::thread::{swap_worker_rng, worker_seed};
use crate::dataset::Dataset;
use crate::minibatch::MiniBatch;
use anyhow::{anyhow, Result};
use crossbeam_channel::RecvTimeoutError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

use super::loader::DataLoader;
use super::workers::pool::WorkerPool;
use super::workers::{process_batch, spawn_epoch_pool, BatchOutput, BatchTask};

pub struct DataLoaderIter<'a, D, C> {
    loader: &'a DataLoader<D, C>,
    epoch: usize,
    batches: Vec<Vec<usize>>,
    next_yield: usize,
    workers: Option<WorkerState>,
    inline_rng: Option<StdRng>,
}

struct WorkerState {
    pool: WorkerPool<BatchTask, BatchOutput>,
    next_dispatch: usize,
    pending: BTreeMap<usize, Result<MiniBatch>>,
}

impl<'a, D, C> DataLoaderIter<'a, D, C>
where
    D: Dataset + 'static,
    C: Collator + Clone + Send + Sync + 'static,
{
    pub(crate) fn new(loader: &'a DataLoader<D, C>, epoch: usize) -> Result<Self> {
        let batches: Vec<Vec<usize>> = loader.batch_sampler.iter(epoch).collect();
        let config = &loader.config;

        let mut inline_rng = None;
        let workers = if config.num_workers > 0 && !batches.is_empty() {
            let pool = spawn_epoch_pool(
                loader.dataset.clone(),
                loader.collator.clone(),
                config.num_workers,
                config.prefetch_factor,
                config.worker_timeout,
                epoch,
                loader.seed,
            )?;
            Some(WorkerState {
                pool,
                next_dispatch: 0,
                pending: BTreeMap::new(),
            })
        } else {
            inline_rng = Some(StdRng::seed_from_u64(worker_seed(0, epoch, loader.seed)));
            None
        };

        let mut iter = Self {
            loader,
            epoch,
            batches,
            next_yield: 0,
            workers,
            inline_rng,
        };
        iter.fill_pipeline()?;
        Ok(iter)
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Dispatches batches until the in-flight window is full.
    fn fill_pipeline(&mut self) -> Result<()> {
        let Some(state) = self.workers.as_mut() else {
            return Ok(());
        };
        let window = state.pool.num_workers() * self.loader.config.prefetch_factor;
        while state.next_dispatch < self.batches.len()
            && state.next_dispatch < self.next_yield + window
        {
            let batch_index = state.next_dispatch;
            let task = BatchTask {
                batch_index,
                indices: std::mem::take(&mut self.batches[batch_index]),
            };
            state
                .pool
                .send_to(batch_index % state.pool.num_workers(), task)?;
            state.next_dispatch += 1;
        }
        Ok(())
    }

    /// Outer error: the pool itself failed. Inner: this batch failed.
    fn next_from_workers(&mut self) -> Result<Result<MiniBatch>> {
        let timeout = self.loader.config.timeout;
        let state = self
            .workers
            .as_mut()
            .ok_or_else(|| anyhow!("Worker state missing"))?;

        let result = loop {
            if let Some(result) = state.pending.remove(&self.next_yield) {
                break result;
            }
            match state.pool.output_rx.recv_timeout(timeout) {
                Ok((batch_index, result)) => {
                    state.pending.insert(batch_index, result);
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(anyhow!(
                        "Worker timeout after {:?} waiting for batch {} - possible deadlock or slow data loading",
                        timeout,
                        self.next_yield
                    ));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(anyhow!(
                        "Worker channel disconnected - workers may have crashed"
                    ));
                }
            }
        };

        self.next_yield += 1;
        self.fill_pipeline()?;
        Ok(result)
    }
}

impl<D, C> Iterator for DataLoaderIter<'_, D, C>
where
    D: Dataset + 'static,
    C: Collator + Clone + Send + Sync + 'static,
{
    type Item = Result<MiniBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_yield >= self.batches.len() {
            return None;
        }

        if self.workers.is_some() {
            return Some(self.next_from_workers().unwrap_or_else(|err| {
                // A stalled or broken pool cannot recover; end the epoch.
                self.next_yield = self.batches.len();
                self.workers = None;
                Err(err)
            }));
        }

        let indices = std::mem::take(&mut self.batches[self.next_yield]);
        self.next_yield += 1;

        let previous = swap_worker_rng(self.inline_rng.take());
        let result = process_batch(self.loader.dataset.as_ref(), &indices, &self.loader.collator);
        self.inline_rng = swap_worker_rng(previous);
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.batches.len() - self.next_yield;
        (remaining, Some(remaining))
    }
}
