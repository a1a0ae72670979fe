//! Parallel-for over a dedicated worker pool.
//!
//! Each worker slot owns one state object for the whole call and pulls loop
//! indices from a shared counter until the range is exhausted. States are kept
//! by the caller between calls, so scratch buffers are allocated once.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::errors::SettingsError;

/// Fixed-size pool of worker threads.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Build a pool of `workers` threads; `0` uses one per available core.
    pub fn new(workers: usize) -> Result<Self, SettingsError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("robustfit-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    /// Number of worker slots.
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Grow `states` to one entry per worker slot using `factory`.
    ///
    /// Existing states are kept, so repeated calls reuse them.
    pub fn fill_states<S>(&self, states: &mut Vec<S>, mut factory: impl FnMut() -> S) {
        while states.len() < self.workers() {
            states.push(factory());
        }
    }

    /// Run `body(state, i)` for every `i` in `range`.
    ///
    /// One task per element of `states` is spawned; each task has exclusive
    /// access to its state for the whole call. Which task runs which index is
    /// not specified, so `body` must not depend on it for its results.
    pub fn for_each_with_state<S, F>(&self, range: Range<usize>, states: &mut [S], body: F)
    where
        S: Send,
        F: Fn(&mut S, usize) + Sync,
    {
        let next = AtomicUsize::new(range.start);
        let end = range.end;
        let body = &body;
        let next = &next;

        self.pool.scope(|scope| {
            for state in states.iter_mut() {
                scope.spawn(move |_| loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    if i >= end {
                        break;
                    }
                    body(state, i);
                });
            }
        });
    }
}
