//! Core capability traits for robust model matching.
//!
//! The estimators in this crate never look inside a model or a point. Everything
//! model-specific is supplied by the caller through four small traits:
//! - [`ModelManager`] creates model instances and copies one into another.
//! - [`ModelGenerator`] fits a model to a (minimal or larger) set of points.
//! - [`DistanceFromModel`] measures the residual of a point against a model.
//! - [`ModelCodec`] flattens a model into a parameter vector (only needed by
//!   [`StatisticalDistanceMatcher`](crate::statistical::StatisticalDistanceMatcher)).
//!
//! Every estimator exposes the same [`ModelMatcher`] surface.

/// Creates and copies model instances.
///
/// Models may have variable internal structure, so the estimators never clone
/// them directly; every new instance and every copy goes through this trait.
pub trait ModelManager<M> {
    /// Create a fresh model instance.
    fn create_model(&self) -> M;

    /// Copy the state of `src` into `dst`.
    fn copy_model(&self, src: &M, dst: &mut M);
}

/// Fits a model to a set of points.
pub trait ModelGenerator<M, P> {
    /// Number of points in a minimal sample.
    fn min_points(&self) -> usize;

    /// Fit `model` to `points`.
    ///
    /// Returns `false` if the points are degenerate or the fit failed, in which
    /// case the content of `model` is unspecified. On success the whole state
    /// of `model` must be overwritten: estimators recycle model instances
    /// between trials.
    fn generate(&mut self, points: &[P], model: &mut M) -> bool;
}

/// Residual of a point with respect to a bound model.
pub trait DistanceFromModel<M, P> {
    /// Bind the model residuals are computed against.
    fn set_model(&mut self, model: &M);

    /// Non-negative residual of a single point.
    fn distance(&self, point: &P) -> f64;

    /// Residuals for a batch of points, written into `out[..points.len()]`.
    fn distances(&self, points: &[P], out: &mut [f64]) {
        for (dst, point) in out.iter_mut().zip(points) {
            *dst = self.distance(point);
        }
    }
}

/// Encodes a model as a flat parameter vector.
pub trait ModelCodec<M> {
    /// Number of parameters in the encoding.
    fn param_len(&self) -> usize;

    /// Write the parameters of `model` into `params[..param_len()]`.
    fn encode(&self, model: &M, params: &mut [f64]);

    /// Rebuild `model` from `params[..param_len()]`.
    fn decode(&self, params: &[f64], model: &mut M);
}

/// Common surface of every robust estimator.
///
/// Callers must check the result of [`process`](ModelMatcher::process) before
/// reading any accessor: after a failed call they reflect the last rejected
/// state.
pub trait ModelMatcher<M, P> {
    /// Search for the model that best explains `data`.
    fn process(&mut self, data: &[P]) -> bool;

    /// Best model found by the last successful call.
    fn model(&self) -> &M;

    /// Points consistent with the model.
    fn match_set(&self) -> &[P];

    /// Index in the input of the `match_index`-th element of the match set.
    fn input_index(&self, match_index: usize) -> usize {
        self.match_to_input()[match_index]
    }

    /// Input index of every element of the match set.
    fn match_to_input(&self) -> &[usize];

    /// Scalar fit quality. Whether larger or smaller is better depends on the
    /// estimator.
    fn fit_quality(&self) -> f64;

    /// Minimum number of points `process` needs.
    fn min_points(&self) -> usize;
}
