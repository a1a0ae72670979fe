//! Least-Median-of-Squares with trials spread over a worker pool.
//!
//! Results are identical to [`LeastMedianOfSquares`] for the same seed and
//! input, whatever the number of workers:
//! - every trial draws from its own random source, derived sequentially from the
//!   master seed before any trial runs;
//! - every trial starts sampling from the identity permutation;
//! - a trial whose score ties the current best only wins if its index is
//!   smaller, which is the order the sequential loop would have preferred.
//!
//! [`LeastMedianOfSquares`]: crate::lmeds::LeastMedianOfSquares

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use log::{debug, trace};
use parking_lot::Mutex;

use crate::context::TrialContext;
use crate::core::{DistanceFromModel, ModelGenerator, ModelManager, ModelMatcher};
use crate::errors::SettingsError;
use crate::lmeds::{inlier_count, score_trial, MatchSet};
use crate::parallel::WorkerPool;
use crate::samplers::trial_seeds;
use crate::settings::{ConcurrencySettings, LmedsSettings};

/// Best result found so far, shared by all workers.
struct BestRecord<M> {
    model: M,
    score: f64,
    trial: Option<usize>,
}

impl<M> BestRecord<M> {
    /// Whether a trial with `score` replaces this record.
    ///
    /// Equal scores only win from an earlier trial. An unset record is never
    /// beaten by an infinite or NaN score, as in the sequential loop.
    fn is_beaten_by(&self, score: f64, trial: usize) -> bool {
        score < self.score || (score == self.score && self.trial.is_some_and(|t| trial < t))
    }
}

/// Least-Median-of-Squares estimator, multi-threaded.
///
/// Fit quality is the best generalized median; smaller is better.
pub struct LeastMedianOfSquaresConcurrent<M, P, MM, G, D> {
    settings: LmedsSettings,
    manager: MM,
    generator: G,
    distance: D,
    sample_size: usize,
    pool: WorkerPool,
    contexts: Vec<TrialContext<M, P, G, D>>,
    seeds: Vec<u64>,

    best: BestRecord<M>,
    matches: MatchSet<P>,
    trials_with_model: usize,
}

impl<M, P, MM, G, D> LeastMedianOfSquaresConcurrent<M, P, MM, G, D>
where
    M: Send,
    P: Clone + Send + Sync,
    MM: ModelManager<M>,
    G: ModelGenerator<M, P> + Clone + Send,
    D: DistanceFromModel<M, P> + Clone + Send,
{
    /// `generator` and `distance` are prototypes: each worker slot gets its
    /// own clone.
    pub fn new(
        settings: LmedsSettings,
        concurrency: ConcurrencySettings,
        manager: MM,
        generator: G,
        distance: D,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let sample_size = generator.min_points();
        if sample_size == 0 {
            return Err(SettingsError::ZeroSampleSize);
        }

        let pool = WorkerPool::new(concurrency.workers)?;
        let best = BestRecord {
            model: manager.create_model(),
            score: f64::INFINITY,
            trial: None,
        };
        Ok(Self {
            settings,
            manager,
            generator,
            distance,
            sample_size,
            pool,
            contexts: Vec::new(),
            seeds: Vec::new(),
            best,
            matches: MatchSet::new(),
            trials_with_model: 0,
        })
    }

    pub fn settings(&self) -> &LmedsSettings {
        &self.settings
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.settings.seed = seed;
    }

    /// Number of worker slots.
    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Trial that produced the best model in the last call.
    pub fn best_trial(&self) -> Option<usize> {
        self.best.trial
    }

    /// Number of trials in the last call whose generator produced a model.
    pub fn trials_with_model(&self) -> usize {
        self.trials_with_model
    }

    /// Copy the best model into `dst`.
    pub fn copy_model_into(&self, dst: &mut M) {
        self.manager.copy_model(&self.best.model, dst);
    }

    fn run_trials(&mut self, data: &[P]) {
        let sample_size = self.sample_size;
        let error_fraction = self.settings.error_fraction;
        let seeds = self.seeds.as_slice();

        // Lock-free mirror of the best score. It only ever decreases, so a
        // stale read can let a hopeless candidate take the lock but never
        // turns away one that could win.
        let best_bits = AtomicU64::new(self.best.score.to_bits());
        let generated = AtomicUsize::new(0);
        let shared = Mutex::new(&mut self.best);

        self.pool
            .for_each_with_state(0..seeds.len(), &mut self.contexts, |ctx, trial| {
                let Some(score) = score_trial(ctx, data, sample_size, seeds[trial], error_fraction)
                else {
                    return;
                };
                generated.fetch_add(1, Ordering::Relaxed);

                if !(score <= f64::from_bits(best_bits.load(Ordering::Relaxed))) {
                    return;
                }

                // Re-check under the lock; another worker may have committed
                // in between, in which case this comparison runs twice.
                let mut best = shared.lock();
                if best.is_beaten_by(score, trial) {
                    trace!("lmeds: trial {trial} improved median to {score}");
                    std::mem::swap(&mut ctx.candidate, &mut best.model);
                    best.score = score;
                    best.trial = Some(trial);
                    best_bits.store(score.to_bits(), Ordering::Relaxed);
                }
            });

        self.trials_with_model = generated.into_inner();
    }
}

impl<M, P, MM, G, D> ModelMatcher<M, P> for LeastMedianOfSquaresConcurrent<M, P, MM, G, D>
where
    M: Send,
    P: Clone + Send + Sync,
    MM: ModelManager<M>,
    G: ModelGenerator<M, P> + Clone + Send,
    D: DistanceFromModel<M, P> + Clone + Send,
{
    fn process(&mut self, data: &[P]) -> bool {
        let n = data.len();
        self.matches.clear();
        self.best.score = f64::INFINITY;
        self.best.trial = None;
        self.trials_with_model = 0;

        if n < self.sample_size {
            debug!(
                "lmeds-mt: {n} points is fewer than the sample size {}",
                self.sample_size
            );
            return false;
        }

        trial_seeds(self.settings.seed, self.settings.total_cycles, &mut self.seeds);
        self.pool.fill_states(&mut self.contexts, || {
            TrialContext::new(&self.manager, self.generator.clone(), self.distance.clone())
        });
        for ctx in &mut self.contexts {
            ctx.resize(n);
        }

        self.run_trials(data);

        let success = self.best.trial.is_some() && self.best.score <= self.settings.max_median_error;
        if success {
            let count = inlier_count(&self.settings, n, self.sample_size);
            self.matches
                .select(&mut self.distance, &self.best.model, data, count);
        }

        debug!(
            "lmeds-mt: points={n} workers={} trials_with_model={} best_score={} best_trial={:?} success={success}",
            self.pool.workers(),
            self.trials_with_model,
            self.best.score,
            self.best.trial
        );
        success
    }

    fn model(&self) -> &M {
        &self.best.model
    }

    fn match_set(&self) -> &[P] {
        &self.matches.points
    }

    fn match_to_input(&self) -> &[usize] {
        &self.matches.to_input
    }

    fn fit_quality(&self) -> f64 {
        self.best.score
    }

    fn min_points(&self) -> usize {
        self.sample_size
    }
}
