//! Configuration types for the robust estimators.
//!
//! Each estimator takes one settings struct. All of them carry `Default`
//! values suitable for small problems and a `validate` method that the
//! estimator constructors call, so an invalid configuration never reaches
//! `process`.

use crate::errors::{check_count, check_threshold, check_unit_fraction, SettingsError};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 0xDEAD_BEEF;

/// Settings for [`Ransac`](crate::ransac::Ransac).
#[derive(Debug, Clone, PartialEq)]
pub struct RansacSettings {
    /// Number of random samples drawn.
    pub max_iterations: usize,
    /// A point is an inlier when its residual is at most this value.
    pub inlier_threshold: f64,
    /// Minimum consensus size for the fit to be accepted.
    pub min_fit_size: usize,
    /// Master seed of the random source.
    pub seed: u64,
}

impl Default for RansacSettings {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            inlier_threshold: 1.0,
            min_fit_size: 1,
            seed: DEFAULT_SEED,
        }
    }
}

impl RansacSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_count("max_iterations", self.max_iterations)?;
        check_threshold("inlier_threshold", self.inlier_threshold)?;
        Ok(())
    }
}

/// Settings for the Least-Median-of-Squares estimators.
#[derive(Debug, Clone, PartialEq)]
pub struct LmedsSettings {
    /// Number of random samples drawn.
    pub total_cycles: usize,
    /// The fit is rejected if the best median exceeds this value.
    pub max_median_error: f64,
    /// Fraction of points kept as the match set. `0.0` keeps every point.
    pub inlier_fraction: f64,
    /// Quantile scored per trial. `0.5` is the true median.
    pub error_fraction: f64,
    /// Master seed from which every per-trial random source is derived.
    pub seed: u64,
}

impl Default for LmedsSettings {
    fn default() -> Self {
        Self {
            total_cycles: 500,
            max_median_error: f64::INFINITY,
            inlier_fraction: 0.0,
            error_fraction: 0.5,
            seed: DEFAULT_SEED,
        }
    }
}

impl LmedsSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_count("total_cycles", self.total_cycles)?;
        check_threshold("max_median_error", self.max_median_error)?;
        if self.inlier_fraction != 0.0 {
            check_unit_fraction("inlier_fraction", self.inlier_fraction)?;
        }
        check_unit_fraction("error_fraction", self.error_fraction)?;
        Ok(())
    }
}

/// Worker pool sizing for the concurrent estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConcurrencySettings {
    /// Number of worker threads. `0` uses one per available core.
    pub workers: usize,
}

/// Residual statistic used by
/// [`StatisticalDistanceMatcher`](crate::statistical::StatisticalDistanceMatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualStatistic {
    /// Center is the mean residual; points above
    /// `mean + prune_threshold * stdev` are pruned.
    Mean,
    /// Center is the median residual; only the `prune_threshold` fraction of
    /// points with the lowest residuals survive a prune.
    Percentile,
}

/// Settings for [`StatisticalDistanceMatcher`](crate::statistical::StatisticalDistanceMatcher).
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticalSettings {
    /// Maximum number of refit/prune rounds.
    pub max_iterations: usize,
    /// Converged once the mean absolute parameter change is at most this.
    pub min_change: f64,
    /// Converged once the center statistic drops below this.
    pub exit_center_error: f64,
    /// The fit fails unless the final center statistic is below this.
    pub fail_error: f64,
    /// The fit fails if fewer points than this remain.
    pub min_fit_points: usize,
    pub statistic: ResidualStatistic,
    /// Stdev multiplier for [`ResidualStatistic::Mean`], kept fraction for
    /// [`ResidualStatistic::Percentile`].
    pub prune_threshold: f64,
}

impl Default for StatisticalSettings {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            min_change: 1e-8,
            exit_center_error: 0.0,
            fail_error: f64::INFINITY,
            min_fit_points: 1,
            statistic: ResidualStatistic::Mean,
            prune_threshold: 2.0,
        }
    }
}

impl StatisticalSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_count("max_iterations", self.max_iterations)?;
        check_count("min_fit_points", self.min_fit_points)?;
        check_threshold("min_change", self.min_change)?;
        check_threshold("exit_center_error", self.exit_center_error)?;
        check_threshold("fail_error", self.fail_error)?;
        match self.statistic {
            ResidualStatistic::Mean => check_threshold("prune_threshold", self.prune_threshold),
            ResidualStatistic::Percentile => {
                check_unit_fraction("prune_threshold", self.prune_threshold)
            }
        }
    }
}
