//! Thread-local worker identity and random source.
//!
//! Each loader worker gets an ID and its own seeded RNG so augmentation
//! draws never contend on a shared generator and stay reproducible for a
//! given `(seed, epoch, worker)` triple.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::cell::RefCell;

thread_local! {
    /// Thread-local worker ID (0 to num_workers-1), set when a worker spawns.
    pub static WORKER_ID: RefCell<usize> = const { RefCell::new(0) };

    /// Thread-local RNG for deterministic augmentation in workers
    pub static WORKER_RNG: RefCell<Option<StdRng>> = const { RefCell::new(None) };
}

/// Seed formula: base_seed + (epoch << 32) + worker_id
pub(crate) fn worker_seed(worker_id: usize, epoch: usize, base_seed: u64) -> u64 {
    base_seed
        .wrapping_add((epoch as u64) << 32)
        .wrapping_add(worker_id as u64)
}

/// Initialize the calling thread's RNG from worker_id, epoch and base seed.
pub fn init_worker_rng(worker_id: usize, epoch: usize, base_seed: u64) {
    let seed = worker_seed(worker_id, epoch, base_seed);
    WORKER_RNG.with(|rng| *rng.borrow_mut() = Some(StdRng::seed_from_u64(seed)))
}

/// Installs `rng` as the calling thread's worker RNG and returns the one it
/// replaced.
pub(crate) fn swap_worker_rng(rng: Option<StdRng>) -> Option<StdRng> {
    WORKER_RNG.with(|slot| slot.replace(rng))
}

/// Runs `f` with the worker RNG, or with the thread's entropy-seeded RNG if
/// this thread was never initialized through [`init_worker_rng`].
pub fn with_worker_rng<T>(f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
    WORKER_RNG.with(|rng| {
        let mut rng_ref = rng.borrow_mut();
        match rng_ref.as_mut() {
            Some(rng) => f(rng),
            None => f(&mut rand::rng()),
        }
    })
}
