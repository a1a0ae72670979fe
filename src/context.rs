//! Per-trial scratch state.

use rand::Rng;

use crate::core::{DistanceFromModel, ModelGenerator, ModelManager};
use crate::samplers::{add_select, random_draw, reset_indices};

/// Mutable state needed to evaluate one trial: a generator, a distance
/// function, a candidate model and scratch buffers.
///
/// The single-threaded estimators own one context. The concurrent estimator
/// owns one per worker slot and reuses it for every trial that worker runs; a
/// context is never touched by two workers at once.
pub struct TrialContext<M, P, G, D> {
    pub generator: G,
    pub distance: D,
    /// Model produced by the last successful [`generate`](Self::generate).
    pub candidate: M,
    /// Residual of every data point against the candidate.
    pub errors: Vec<f64>,
    /// Index permutation whose prefix holds the last draw.
    pub indices: Vec<usize>,
    /// Points of the last minimal sample.
    pub sample: Vec<P>,
}

impl<M, P, G, D> TrialContext<M, P, G, D>
where
    P: Clone,
    G: ModelGenerator<M, P>,
    D: DistanceFromModel<M, P>,
{
    pub fn new<MM: ModelManager<M>>(manager: &MM, generator: G, distance: D) -> Self {
        Self {
            generator,
            distance,
            candidate: manager.create_model(),
            errors: Vec::new(),
            indices: Vec::new(),
            sample: Vec::new(),
        }
    }

    /// Size the scratch buffers for a dataset of `n` points. Capacity is kept
    /// when `n` shrinks.
    pub fn resize(&mut self, n: usize) {
        self.errors.resize(n, 0.0);
        if self.indices.len() != n {
            reset_indices(&mut self.indices, n);
        }
    }

    /// Draw a fresh minimal sample from the identity permutation using `rng`
    /// and fit the candidate to it.
    ///
    /// Starting from the identity makes the sample a function of `rng` alone.
    /// The O(n) reset is intentional; the residual pass that follows is O(n)
    /// anyway.
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        data: &[P],
        sample_size: usize,
        rng: &mut R,
    ) -> bool {
        reset_indices(&mut self.indices, data.len());
        random_draw(&mut self.indices, sample_size, rng);
        add_select(data, &self.indices[..sample_size], &mut self.sample);
        self.generator.generate(&self.sample, &mut self.candidate)
    }

    /// Compute the residual of every point in `data` against the candidate.
    pub fn compute_errors(&mut self, data: &[P]) -> &mut [f64] {
        let n = data.len();
        self.errors.resize(n, 0.0);
        self.distance.set_model(&self.candidate);
        self.distance.distances(data, &mut self.errors[..n]);
        &mut self.errors[..n]
    }
}
