//! Statistical distance matching: iterative refit and prune.
//!
//! The model is fit to every remaining point, a statistic of the residuals is
//! computed and the points too far from the bulk are dropped. This repeats
//! until the statistic is small enough, the model stops moving, or the
//! iteration budget runs out. Unlike the randomized estimators it assumes the
//! outliers are a minority that does not dominate the initial fit.

use log::{debug, trace};
use nalgebra::DVector;

use crate::core::{DistanceFromModel, ModelCodec, ModelGenerator, ModelManager, ModelMatcher};
use crate::errors::SettingsError;
use crate::settings::{ResidualStatistic, StatisticalSettings};
use crate::types::IndexedPoint;
use crate::utils::{mean_stdev, quantile_rank, select_k};

/// Center statistic and prune threshold of `errors`.
///
/// `scratch` is overwritten; `errors` is left untouched.
fn residual_statistics(
    statistic: ResidualStatistic,
    prune_threshold: f64,
    errors: &[f64],
    scratch: &mut Vec<f64>,
) -> (f64, f64) {
    match statistic {
        ResidualStatistic::Mean => {
            let (mean, stdev) = mean_stdev(errors);
            (mean, mean + prune_threshold * stdev)
        }
        ResidualStatistic::Percentile => {
            let n = errors.len();
            if n == 0 {
                return (f64::NAN, f64::NAN);
            }
            scratch.clear();
            scratch.extend_from_slice(errors);
            let center = select_k(scratch, quantile_rank(n, 0.5));
            let keep = ((n as f64 * prune_threshold).round() as usize).clamp(1, n);
            (center, select_k(scratch, keep - 1))
        }
    }
}

/// Drop every point whose residual exceeds `threshold`, keeping the order of
/// the survivors. `errors[i]` is the residual of `working[i]`.
fn prune<P>(working: &mut Vec<IndexedPoint<P>>, errors: &[f64], threshold: f64) {
    let mut kept = 0;
    for i in 0..working.len() {
        if errors[i] <= threshold {
            working.swap(kept, i);
            kept += 1;
        }
    }
    working.truncate(kept);
}

/// Mean absolute difference between two parameter vectors.
fn parameter_change(current: &DVector<f64>, previous: &DVector<f64>) -> f64 {
    if current.is_empty() {
        return f64::INFINITY;
    }
    (current - previous).lp_norm(1) / current.len() as f64
}

/// Iterative refit-and-prune estimator.
///
/// Fit quality is the center statistic of the final working set (mean or
/// median residual); smaller is better.
pub struct StatisticalDistanceMatcher<M, P, MM, G, D, C> {
    settings: StatisticalSettings,
    manager: MM,
    generator: G,
    distance: D,
    codec: C,

    model: M,
    candidate: M,
    params: DVector<f64>,
    previous: DVector<f64>,

    working: Vec<IndexedPoint<P>>,
    points: Vec<P>,
    errors: Vec<f64>,
    scratch: Vec<f64>,

    center_error: f64,
    prune_value: f64,
    iterations: usize,
    converged: bool,
    match_set: Vec<P>,
    match_to_input: Vec<usize>,
}

impl<M, P, MM, G, D, C> StatisticalDistanceMatcher<M, P, MM, G, D, C>
where
    P: Clone,
    MM: ModelManager<M>,
    G: ModelGenerator<M, P>,
    D: DistanceFromModel<M, P>,
    C: ModelCodec<M>,
{
    pub fn new(
        settings: StatisticalSettings,
        manager: MM,
        generator: G,
        distance: D,
        codec: C,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        if generator.min_points() == 0 {
            return Err(SettingsError::ZeroSampleSize);
        }

        let len = codec.param_len();
        Ok(Self {
            model: manager.create_model(),
            candidate: manager.create_model(),
            params: DVector::zeros(len),
            previous: DVector::zeros(len),
            settings,
            manager,
            generator,
            distance,
            codec,
            working: Vec::new(),
            points: Vec::new(),
            errors: Vec::new(),
            scratch: Vec::new(),
            center_error: f64::INFINITY,
            prune_value: f64::INFINITY,
            iterations: 0,
            converged: false,
            match_set: Vec::new(),
            match_to_input: Vec::new(),
        })
    }

    pub fn settings(&self) -> &StatisticalSettings {
        &self.settings
    }

    /// Number of successful refits in the last call.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the last call stopped on a convergence test rather than on the
    /// iteration budget or a failed refit.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Encoded parameters of the current model.
    pub fn parameters(&self) -> &[f64] {
        self.params.as_slice()
    }

    /// Residual threshold used by the last prune decision.
    pub fn prune_value(&self) -> f64 {
        self.prune_value
    }

    fn compute_errors(&mut self) {
        self.distance.set_model(&self.model);
        self.errors.clear();
        self.errors
            .extend(self.working.iter().map(|p| self.distance.distance(&p.point)));
        let (center, threshold) = residual_statistics(
            self.settings.statistic,
            self.settings.prune_threshold,
            &self.errors,
            &mut self.scratch,
        );
        self.center_error = center;
        self.prune_value = threshold;
    }
}

impl<M, P, MM, G, D, C> ModelMatcher<M, P> for StatisticalDistanceMatcher<M, P, MM, G, D, C>
where
    P: Clone,
    MM: ModelManager<M>,
    G: ModelGenerator<M, P>,
    D: DistanceFromModel<M, P>,
    C: ModelCodec<M>,
{
    fn process(&mut self, data: &[P]) -> bool {
        self.match_set.clear();
        self.match_to_input.clear();
        self.center_error = f64::INFINITY;
        self.prune_value = f64::INFINITY;
        self.iterations = 0;
        self.converged = false;

        if data.len() < self.min_points() {
            debug!(
                "statistical: {} points is fewer than the minimum {}",
                data.len(),
                self.min_points()
            );
            return false;
        }

        self.working.clear();
        self.working.extend(
            data.iter()
                .enumerate()
                .map(|(i, p)| IndexedPoint::new(i, p.clone())),
        );

        for iteration in 0..self.settings.max_iterations {
            if self.working.len() < self.generator.min_points() {
                trace!(
                    "statistical: {} points left, generator needs {}",
                    self.working.len(),
                    self.generator.min_points()
                );
                break;
            }
            self.points.clear();
            self.points
                .extend(self.working.iter().map(|p| p.point.clone()));
            if !self.generator.generate(&self.points, &mut self.candidate) {
                trace!("statistical: refit failed at iteration {iteration}");
                break;
            }
            self.manager.copy_model(&self.candidate, &mut self.model);
            self.iterations += 1;

            self.compute_errors();
            self.codec.encode(&self.model, self.params.as_mut_slice());
            trace!(
                "statistical: iteration {iteration} points={} center={} prune={}",
                self.working.len(),
                self.center_error,
                self.prune_value
            );

            if self.center_error < self.settings.exit_center_error {
                self.converged = true;
                break;
            }
            if iteration > 0
                && parameter_change(&self.params, &self.previous) <= self.settings.min_change
            {
                self.converged = true;
                break;
            }

            std::mem::swap(&mut self.params, &mut self.previous);
            prune(&mut self.working, &self.errors, self.prune_value);
        }

        // After a prune the freshest parameters sit in `previous`.
        if !self.converged && self.iterations > 0 {
            std::mem::swap(&mut self.params, &mut self.previous);
        }

        let success = self.center_error < self.settings.fail_error
            && self.working.len() >= self.settings.min_fit_points;
        if success {
            self.match_set
                .extend(self.working.iter().map(|p| p.point.clone()));
            self.match_to_input
                .extend(self.working.iter().map(|p| p.index));
        }

        debug!(
            "statistical: points={} iterations={} converged={} remaining={} center={} success={success}",
            data.len(),
            self.iterations,
            self.converged,
            self.working.len(),
            self.center_error
        );
        success
    }

    fn model(&self) -> &M {
        &self.model
    }

    fn match_set(&self) -> &[P] {
        &self.match_set
    }

    fn match_to_input(&self) -> &[usize] {
        &self.match_to_input
    }

    fn fit_quality(&self) -> f64 {
        self.center_error
    }

    fn min_points(&self) -> usize {
        self.settings.min_fit_points.max(self.generator.min_points())
    }
}
