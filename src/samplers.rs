//! Minimal-sample drawing.
//!
//! The free functions here operate on caller-owned buffers so the estimators can
//! keep their scratch space across trials and across `process` calls.
//! [`UniformRandomSampler`] bundles them with a seeded random source for the
//! single-threaded estimators; the median estimators instead derive one random
//! source per trial with [`trial_seeds`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draw `sample_size` distinct entries of `indices` uniformly without
/// replacement.
///
/// Partial Fisher–Yates shuffle: for `i` in `0..sample_size` a uniformly chosen
/// entry of `indices[i..]` is swapped into position `i`. On return the draw is
/// `indices[..sample_size]`; the order of the remaining entries is unspecified.
///
/// Requires `sample_size <= indices.len()`.
pub fn random_draw<R: Rng + ?Sized>(indices: &mut [usize], sample_size: usize, rng: &mut R) {
    let n = indices.len();
    debug_assert!(sample_size <= n);
    for i in 0..sample_size {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }
}

/// Clear `out` and fill it with `data[i]` for each `i` in `indices`, in order.
pub fn add_select<P: Clone>(data: &[P], indices: &[usize], out: &mut Vec<P>) {
    out.clear();
    out.extend(indices.iter().map(|&i| data[i].clone()));
}

/// Set `indices` to the identity permutation `0..n`, reusing its allocation.
pub fn reset_indices(indices: &mut Vec<usize>, n: usize) {
    indices.clear();
    indices.extend(0..n);
}

/// Derive one seed per trial from `master`, sequentially, into `out`.
///
/// Seeds are generated before any trial runs, so which seed a trial gets never
/// depends on the order in which trials execute.
pub fn trial_seeds(master: u64, trials: usize, out: &mut Vec<u64>) {
    let mut rng = StdRng::seed_from_u64(master);
    out.clear();
    out.extend((0..trials).map(|_| rng.gen::<u64>()));
}

/// Uniform random sampler drawing minimal samples without replacement.
///
/// Keeps its index array between draws; only its prefix is meaningful after a
/// draw.
pub struct UniformRandomSampler {
    rng: StdRng,
    indices: Vec<usize>,
}

impl UniformRandomSampler {
    /// Construct a sampler from a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            indices: Vec::new(),
        }
    }

    /// Reseed the random source and forget the index permutation.
    pub fn reset(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.indices.clear();
    }

    /// Draw `sample_size` distinct indices out of `0..n`.
    ///
    /// Returns `None` if `sample_size` is zero or larger than `n`.
    pub fn draw(&mut self, n: usize, sample_size: usize) -> Option<&[usize]> {
        if sample_size == 0 || sample_size > n {
            return None;
        }
        if self.indices.len() != n {
            reset_indices(&mut self.indices, n);
        }
        random_draw(&mut self.indices, sample_size, &mut self.rng);
        Some(&self.indices[..sample_size])
    }

    /// Draw a minimal sample and copy the chosen points into `out`.
    pub fn sample<P: Clone>(&mut self, data: &[P], sample_size: usize, out: &mut Vec<P>) -> bool {
        match self.draw(data.len(), sample_size) {
            Some(chosen) => {
                add_select(data, chosen, out);
                true
            }
            None => false,
        }
    }
}
