//! Maximum-consensus search (RANSAC).
//!
//! Every trial fits a candidate to a random minimal sample and counts the points
//! whose residual is within a fixed threshold. The candidate with the largest
//! count wins; on a tie the earlier candidate is kept.

use log::{debug, trace};

use crate::context::TrialContext;
use crate::core::{DistanceFromModel, ModelGenerator, ModelManager, ModelMatcher};
use crate::errors::SettingsError;
use crate::samplers::UniformRandomSampler;
use crate::settings::RansacSettings;

/// Count the points of `data` with residual at most `threshold`.
///
/// With `beat = Some(best)` the scan stops as soon as the remaining points can
/// no longer lift the count above `best`, and `None` is returned. The bound
/// relies on every point adding zero or one to the count.
pub fn count_inliers<M, P, D>(
    distance: &D,
    data: &[P],
    threshold: f64,
    beat: Option<usize>,
) -> Option<usize>
where
    D: DistanceFromModel<M, P>,
{
    let n = data.len();
    let mut counted = 0usize;
    for (i, point) in data.iter().enumerate() {
        if let Some(best) = beat {
            if counted + (n - i) <= best {
                return None;
            }
        }
        if distance.distance(point) <= threshold {
            counted += 1;
        }
    }
    match beat {
        Some(best) if counted <= best => None,
        _ => Some(counted),
    }
}

/// RANSAC estimator.
///
/// Fit quality is the size of the match set; larger is better.
pub struct Ransac<M, P, MM, G, D> {
    settings: RansacSettings,
    manager: MM,
    sampler: UniformRandomSampler,
    ctx: TrialContext<M, P, G, D>,
    sample_size: usize,

    best: M,
    match_set: Vec<P>,
    match_to_input: Vec<usize>,
    trials_with_model: usize,
}

impl<M, P, MM, G, D> Ransac<M, P, MM, G, D>
where
    P: Clone,
    MM: ModelManager<M>,
    G: ModelGenerator<M, P>,
    D: DistanceFromModel<M, P>,
{
    pub fn new(
        settings: RansacSettings,
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
            sampler: UniformRandomSampler::from_seed(settings.seed),
            settings,
            manager,
            ctx,
            sample_size,
            best,
            match_set: Vec::new(),
            match_to_input: Vec::new(),
            trials_with_model: 0,
        })
    }

    pub fn settings(&self) -> &RansacSettings {
        &self.settings
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.settings.seed = seed;
    }

    /// Number of trials in the last call whose generator produced a model.
    pub fn trials_with_model(&self) -> usize {
        self.trials_with_model
    }

    /// Copy the best model into `dst`.
    pub fn copy_model_into(&self, dst: &mut M) {
        self.manager.copy_model(&self.best, dst);
    }

    fn select_match_set(&mut self, data: &[P]) {
        self.match_set.clear();
        self.match_to_input.clear();
        self.ctx.distance.set_model(&self.best);
        for (i, point) in data.iter().enumerate() {
            if self.ctx.distance.distance(point) <= self.settings.inlier_threshold {
                self.match_set.push(point.clone());
                self.match_to_input.push(i);
            }
        }
    }
}

impl<M, P, MM, G, D> ModelMatcher<M, P> for Ransac<M, P, MM, G, D>
where
    P: Clone,
    MM: ModelManager<M>,
    G: ModelGenerator<M, P>,
    D: DistanceFromModel<M, P>,
{
    fn process(&mut self, data: &[P]) -> bool {
        self.match_set.clear();
        self.match_to_input.clear();
        self.trials_with_model = 0;

        if data.len() < self.sample_size {
            debug!(
                "ransac: {} points is fewer than the sample size {}",
                data.len(),
                self.sample_size
            );
            return false;
        }

        self.sampler.reset(self.settings.seed);
        let threshold = self.settings.inlier_threshold;
        let mut best_count: Option<usize> = None;

        for trial in 0..self.settings.max_iterations {
            if !self
                .sampler
                .sample(data, self.sample_size, &mut self.ctx.sample)
            {
                continue;
            }
            if !self
                .ctx
                .generator
                .generate(&self.ctx.sample, &mut self.ctx.candidate)
            {
                continue;
            }
            self.trials_with_model += 1;

            self.ctx.distance.set_model(&self.ctx.candidate);
            let count = count_inliers::<M, P, D>(&self.ctx.distance, data, threshold, best_count);
            if let Some(count) = count {
                trace!("ransac: trial {trial} improved consensus to {count}");
                std::mem::swap(&mut self.ctx.candidate, &mut self.best);
                best_count = Some(count);
            }
        }

        let success = match best_count {
            Some(count) if count >= self.settings.min_fit_size => {
                self.select_match_set(data);
                true
            }
            _ => false,
        };

        debug!(
            "ransac: points={} trials_with_model={} best_count={:?} success={}",
            data.len(),
            self.trials_with_model,
            best_count,
            success
        );
        success
    }

    fn model(&self) -> &M {
        &self.best
    }

    fn match_set(&self) -> &[P] {
        &self.match_set
    }

    fn match_to_input(&self) -> &[usize] {
        &self.match_to_input
    }

    fn fit_quality(&self) -> f64 {
        self.match_set.len() as f64
    }

    fn min_points(&self) -> usize {
        self.sample_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScalarManager;

    impl ModelManager<f64> for ScalarManager {
        fn create_model(&self) -> f64 {
            0.0
        }

        fn copy_model(&self, src: &f64, dst: &mut f64) {
            *dst = *src;
        }
    }

    /// Takes the single sampled value as the model; fails on negative values.
    struct PickGenerator;

    impl ModelGenerator<f64, f64> for PickGenerator {
        fn min_points(&self) -> usize {
            1
        }

        fn generate(&mut self, points: &[f64], model: &mut f64) -> bool {
            if points[0] < 0.0 {
                return false;
            }
            *model = points[0];
            true
        }
    }

    struct AbsDistance(f64);

    impl DistanceFromModel<f64, f64> for AbsDistance {
        fn set_model(&mut self, model: &f64) {
            self.0 = *model;
        }

        fn distance(&self, point: &f64) -> f64 {
            (point - self.0).abs()
        }
    }

    type ScalarRansac = Ransac<f64, f64, ScalarManager, PickGenerator, AbsDistance>;

    fn ransac(settings: RansacSettings) -> ScalarRansac {
        Ransac::new(settings, ScalarManager, PickGenerator, AbsDistance(0.0)).unwrap()
    }

    fn planted() -> Vec<f64> {
        let mut data: Vec<f64> = (0..30).map(|i| 5.0 + 0.01 * (i % 7) as f64).collect();
        data.extend((0..10).map(|i| 100.0 + 10.0 * i as f64));
        data
    }

    #[test]
    fn count_inliers_without_bound_counts_everything() {
        let d = AbsDistance(0.0);
        let data = [0.1, 2.0, -0.3, 0.5, 9.0];
        assert_eq!(count_inliers::<f64, f64, _>(&d, &data, 0.5, None), Some(3));
    }

    #[test]
    fn count_inliers_aborts_hopeless_scans() {
        let d = AbsDistance(0.0);
        let data = [9.0, 9.0, 9.0, 0.0, 0.0];
        // Two inliers can never beat three.
        assert_eq!(count_inliers::<f64, f64, _>(&d, &data, 0.5, Some(3)), None);
        // Nor tie with two.
        assert_eq!(count_inliers::<f64, f64, _>(&d, &data, 0.5, Some(2)), None);
        assert_eq!(count_inliers::<f64, f64, _>(&d, &data, 0.5, Some(1)), Some(2));
    }

    #[test]
    fn finds_planted_majority() {
        let data = planted();
        let mut alg = ransac(RansacSettings {
            max_iterations: 50,
            inlier_threshold: 0.1,
            min_fit_size: 20,
            ..Default::default()
        });

        assert!(alg.process(&data));
        assert!((alg.model() - 5.03).abs() < 0.1);
        assert_eq!(alg.match_set().len(), 30);
        assert_eq!(alg.fit_quality(), 30.0);
        assert_eq!(alg.match_to_input(), (0..30).collect::<Vec<_>>().as_slice());
        assert_eq!(alg.input_index(4), 4);
    }

    #[test]
    fn rejects_small_consensus() {
        let data = planted();
        let mut alg = ransac(RansacSettings {
            inlier_threshold: 0.1,
            min_fit_size: 31,
            ..Default::default()
        });
        assert!(!alg.process(&data));
    }

    #[test]
    fn fails_when_no_candidate_is_generated() {
        let mut alg = ransac(RansacSettings::default());
        assert!(!alg.process(&[-1.0, -2.0, -3.0]));
        assert_eq!(alg.trials_with_model(), 0);
    }

    #[test]
    fn fails_on_empty_input() {
        let mut alg = ransac(RansacSettings::default());
        assert!(!alg.process(&[]));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let data = planted();
        let mut alg = ransac(RansacSettings {
            inlier_threshold: 0.02,
            ..Default::default()
        });

        assert!(alg.process(&data));
        let model = *alg.model();
        let matches = alg.match_to_input().to_vec();

        assert!(alg.process(&data));
        assert_eq!(alg.model().to_bits(), model.to_bits());
        assert_eq!(alg.match_to_input(), matches.as_slice());
    }

    #[test]
    fn zero_sample_size_is_a_configuration_error() {
        struct Empty;
        impl ModelGenerator<f64, f64> for Empty {
            fn min_points(&self) -> usize {
                0
            }
            fn generate(&mut self, _points: &[f64], _model: &mut f64) -> bool {
                false
            }
        }

        let result = Ransac::new(
            RansacSettings::default(),
            ScalarManager,
            Empty,
            AbsDistance(0.0),
        );
        assert!(matches!(result, Err(SettingsError::ZeroSampleSize)));
    }
}
