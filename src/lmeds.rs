//! Least-Median-of-Squares.
//!
//! Trials are scored by a generalized median of the residuals over the whole
//! dataset (the `error_fraction` quantile, found by selection) and the smallest
//! score wins. Each trial draws its sample from a private random source derived
//! from the master seed, so [`LeastMedianOfSquaresConcurrent`] can reproduce
//! this estimator exactly.
//!
//! [`LeastMedianOfSquaresConcurrent`]: crate::lmeds_concurrent::LeastMedianOfSquaresConcurrent

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::context::TrialContext;
use crate::core::{DistanceFromModel, ModelGenerator, ModelManager, ModelMatcher};
use crate::errors::SettingsError;
use crate::samplers::trial_seeds;
use crate::settings::LmedsSettings;
use crate::utils::{quantile_rank, select_k};

/// Evaluate one trial: draw with the trial's own random source, fit, and
/// return the `error_fraction` quantile of the residuals.
///
/// Returns `None` when the generator rejects the sample.
pub(crate) fn score_trial<M, P, G, D>(
    ctx: &mut TrialContext<M, P, G, D>,
    data: &[P],
    sample_size: usize,
    seed: u64,
    error_fraction: f64,
) -> Option<f64>
where
    P: Clone,
    G: ModelGenerator<M, P>,
    D: DistanceFromModel<M, P>,
{
    let mut rng = StdRng::seed_from_u64(seed);
    if !ctx.generate(data, sample_size, &mut rng) {
        return None;
    }
    let errors = ctx.compute_errors(data);
    let rank = quantile_rank(errors.len(), error_fraction);
    Some(select_k(errors, rank))
}

/// Number of points kept as the match set, or `None` to keep every point.
pub(crate) fn inlier_count(settings: &LmedsSettings, n: usize, sample_size: usize) -> Option<usize> {
    if settings.inlier_fraction <= 0.0 {
        return None;
    }
    let count = ((settings.inlier_fraction * n as f64).round() as usize).min(n);
    (count > sample_size).then_some(count)
}

/// Match set and its mapping to input indices.
pub(crate) struct MatchSet<P> {
    pub points: Vec<P>,
    pub to_input: Vec<usize>,
    ranked: Vec<(f64, usize)>,
}

impl<P: Clone> MatchSet<P> {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            to_input: Vec::new(),
            ranked: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.to_input.clear();
    }

    /// Keep the `count` points of `data` closest to `model`, or all of them when
    /// `count` is `None`. The result is in input order.
    ///
    /// Ties in residual are broken by input index so the selection is
    /// deterministic.
    pub fn select<M, D>(&mut self, distance: &mut D, model: &M, data: &[P], count: Option<usize>)
    where
        D: DistanceFromModel<M, P>,
    {
        self.clear();
        let Some(count) = count else {
            self.points.extend_from_slice(data);
            self.to_input.extend(0..data.len());
            return;
        };

        distance.set_model(model);
        self.ranked.clear();
        self.ranked
            .extend(data.iter().enumerate().map(|(i, p)| (distance.distance(p), i)));
        if count > 0 && count < self.ranked.len() {
            self.ranked
                .select_nth_unstable_by(count - 1, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        }
        let kept = &mut self.ranked[..count];
        kept.sort_unstable_by_key(|&(_, i)| i);

        self.to_input.extend(kept.iter().map(|&(_, i)| i));
        self.points.extend(kept.iter().map(|&(_, i)| data[i].clone()));
    }
}

/// Least-Median-of-Squares estimator, single-threaded.
///
/// Fit quality is the best generalized median; smaller is better.
pub struct LeastMedianOfSquares<M, P, MM, G, D> {
    settings: LmedsSettings,
    manager: MM,
    ctx: TrialContext<M, P, G, D>,
    sample_size: usize,
    seeds: Vec<u64>,

    best: M,
    best_score: f64,
    best_trial: Option<usize>,
    matches: MatchSet<P>,
    trials_with_model: usize,
}

impl<M, P, MM, G, D> LeastMedianOfSquares<M, P, MM, G, D>
where
    P: Clone,
    MM: ModelManager<M>,
    G: ModelGenerator<M, P>,
    D: DistanceFromModel<M, P>,
{
    pub fn new(
        settings: LmedsSettings,
        manager: MM,
        generator: G,
        distance: D,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let sample_size = generator.min_points();
        if sample_size == 0 {
            return Err(SettingsError::ZeroSampleSize);
        }

        let ctx = TrialContext::new(&manager, generator, distance);
        let best = manager.create_model();
        Ok(Self {
            settings,
            manager,
            ctx,
            sample_size,
            seeds: Vec::new(),
            best,
            best_score: f64::INFINITY,
            best_trial: None,
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

    /// Trial that produced the best model in the last call.
    pub fn best_trial(&self) -> Option<usize> {
        self.best_trial
    }

    /// Number of trials in the last call whose generator produced a model.
    pub fn trials_with_model(&self) -> usize {
        self.trials_with_model
    }

    /// Copy the best model into `dst`.
    pub fn copy_model_into(&self, dst: &mut M) {
        self.manager.copy_model(&self.best, dst);
    }
}

impl<M, P, MM, G, D> ModelMatcher<M, P> for LeastMedianOfSquares<M, P, MM, G, D>
where
    P: Clone,
    MM: ModelManager<M>,
    G: ModelGenerator<M, P>,
    D: DistanceFromModel<M, P>,
{
    fn process(&mut self, data: &[P]) -> bool {
        let n = data.len();
        self.matches.clear();
        self.best_score = f64::INFINITY;
        self.best_trial = None;
        self.trials_with_model = 0;

        if n < self.sample_size {
            debug!(
                "lmeds: {n} points is fewer than the sample size {}",
                self.sample_size
            );
            return false;
        }

        trial_seeds(self.settings.seed, self.settings.total_cycles, &mut self.seeds);
        self.ctx.resize(n);

        for (trial, &seed) in self.seeds.iter().enumerate() {
            let Some(score) = score_trial(
                &mut self.ctx,
                data,
                self.sample_size,
                seed,
                self.settings.error_fraction,
            ) else {
                continue;
            };
            self.trials_with_model += 1;

            if score < self.best_score {
                trace!("lmeds: trial {trial} improved median to {score}");
                std::mem::swap(&mut self.ctx.candidate, &mut self.best);
                self.best_score = score;
                self.best_trial = Some(trial);
            }
        }

        let success = self.best_trial.is_some() && self.best_score <= self.settings.max_median_error;
        if success {
            let count = inlier_count(&self.settings, n, self.sample_size);
            self.matches
                .select(&mut self.ctx.distance, &self.best, data, count);
        }

        debug!(
            "lmeds: points={n} trials_with_model={} best_score={} best_trial={:?} success={success}",
            self.trials_with_model, self.best_score, self.best_trial
        );
        success
    }

    fn model(&self) -> &M {
        &self.best
    }

    fn match_set(&self) -> &[P] {
        &self.matches.points
    }

    fn match_to_input(&self) -> &[usize] {
        &self.matches.to_input
    }

    fn fit_quality(&self) -> f64 {
        self.best_score
    }

    fn min_points(&self) -> usize {
        self.sample_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct MockModel {
        offset: f64,
    }

    struct MockManager;

    impl ModelManager<MockModel> for MockManager {
        fn create_model(&self) -> MockModel {
            MockModel::default()
        }

        fn copy_model(&self, src: &MockModel, dst: &mut MockModel) {
            dst.offset = src.offset;
        }
    }

    /// Always produces the same model regardless of the sample.
    struct ConstantGenerator;

    impl ModelGenerator<MockModel, f64> for ConstantGenerator {
        fn min_points(&self) -> usize {
            2
        }

        fn generate(&mut self, _points: &[f64], model: &mut MockModel) -> bool {
            model.offset = 0.0;
            true
        }
    }

    /// Residual is the point's own value shifted by the model offset.
    struct OffsetDistance(f64);

    impl DistanceFromModel<MockModel, f64> for OffsetDistance {
        fn set_model(&mut self, model: &MockModel) {
            self.0 = model.offset;
        }

        fn distance(&self, point: &f64) -> f64 {
            (point - self.0).abs()
        }
    }

    struct FailingGenerator;

    impl ModelGenerator<MockModel, f64> for FailingGenerator {
        fn min_points(&self) -> usize {
            1
        }

        fn generate(&mut self, _points: &[f64], _model: &mut MockModel) -> bool {
            false
        }
    }

    fn residual_fixture(n: usize) -> Vec<f64> {
        // Scrambled, deterministic residuals: (7 * i) mod n.
        (0..n).map(|i| ((7 * i) % n) as f64).collect()
    }

    #[test]
    fn median_matches_hand_computed_order_statistic() {
        let data = residual_fixture(101);
        let mut alg = LeastMedianOfSquares::new(
            LmedsSettings {
                total_cycles: 5,
                ..Default::default()
            },
            MockManager,
            ConstantGenerator,
            OffsetDistance(0.0),
        )
        .unwrap();

        assert!(alg.process(&data));
        // Values are a permutation of 0..101; rank round(101 * 0.5) = 51.
        assert_eq!(alg.fit_quality(), 51.0);
        // Every trial ties, so the first one is kept.
        assert_eq!(alg.best_trial(), Some(0));
        assert_eq!(alg.match_set().len(), data.len());
        assert_eq!(alg.trials_with_model(), 5);
    }

    #[test]
    fn error_fraction_selects_other_quantiles() {
        let data = residual_fixture(40);
        let mut alg = LeastMedianOfSquares::new(
            LmedsSettings {
                total_cycles: 1,
                error_fraction: 0.25,
                ..Default::default()
            },
            MockManager,
            ConstantGenerator,
            OffsetDistance(0.0),
        )
        .unwrap();

        assert!(alg.process(&data));
        assert_eq!(alg.fit_quality(), 10.0);
    }

    #[test]
    fn inlier_fraction_keeps_lowest_residuals_in_input_order() {
        let data = residual_fixture(20);
        let mut alg = LeastMedianOfSquares::new(
            LmedsSettings {
                total_cycles: 3,
                inlier_fraction: 0.25,
                ..Default::default()
            },
            MockManager,
            ConstantGenerator,
            OffsetDistance(0.0),
        )
        .unwrap();

        assert!(alg.process(&data));
        assert_eq!(alg.match_set().len(), 5);
        let mut values = alg.match_set().to_vec();
        values.sort_by(f64::total_cmp);
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0, 4.0]);

        let indices = alg.match_to_input();
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        for (k, &i) in indices.iter().enumerate() {
            assert_eq!(data[i], alg.match_set()[k]);
        }
    }

    #[test]
    fn small_inlier_fraction_keeps_everything() {
        // round(10 * 0.2) = 2 does not exceed the sample size of 2.
        let data = residual_fixture(10);
        let mut alg = LeastMedianOfSquares::new(
            LmedsSettings {
                total_cycles: 1,
                inlier_fraction: 0.2,
                ..Default::default()
            },
            MockManager,
            ConstantGenerator,
            OffsetDistance(0.0),
        )
        .unwrap();

        assert!(alg.process(&data));
        assert_eq!(alg.match_set().len(), 10);
        assert_eq!(alg.match_to_input(), (0..10).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn rejects_median_above_limit() {
        let data = residual_fixture(11);
        let mut alg = LeastMedianOfSquares::new(
            LmedsSettings {
                total_cycles: 2,
                max_median_error: 5.0,
                ..Default::default()
            },
            MockManager,
            ConstantGenerator,
            OffsetDistance(0.0),
        )
        .unwrap();

        // Rank round(5.5) = 6 -> median 6 > 5.
        assert!(!alg.process(&data));
        assert_eq!(alg.fit_quality(), 6.0);
    }

    #[test]
    fn never_generating_a_model_fails_even_without_limit() {
        let mut alg = LeastMedianOfSquares::new(
            LmedsSettings::default(),
            MockManager,
            FailingGenerator,
            OffsetDistance(0.0),
        )
        .unwrap();

        assert!(alg.settings().max_median_error.is_infinite());
        assert!(!alg.process(&[1.0, 2.0, 3.0]));
        assert_eq!(alg.best_trial(), None);
        assert_eq!(alg.trials_with_model(), 0);
    }

    #[test]
    fn too_few_points_fails() {
        let mut alg = LeastMedianOfSquares::new(
            LmedsSettings::default(),
            MockManager,
            ConstantGenerator,
            OffsetDistance(0.0),
        )
        .unwrap();
        assert!(!alg.process(&[1.0]));
        assert!(!alg.process(&[]));
    }

    #[test]
    fn inlier_count_rounds_fraction() {
        let settings = LmedsSettings {
            inlier_fraction: 0.5,
            ..Default::default()
        };
        assert_eq!(inlier_count(&settings, 9, 2), Some(5));
        assert_eq!(inlier_count(&settings, 4, 2), None);
        assert_eq!(inlier_count(&LmedsSettings::default(), 100, 2), None);
    }
}
