//! Configuration errors.
//!
//! Fit failures are not errors: `process` reports them through its boolean
//! result. Only invalid configuration is surfaced here, at construction time.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("model generator requires a sample size of at least 1")]
    ZeroSampleSize,

    #[error("{name} must be at least 1")]
    ZeroCount { name: &'static str },

    #[error("{name} must lie in {range}, got {value}")]
    FractionOutOfRange {
        name: &'static str,
        range: &'static str,
        value: f64,
    },

    #[error("{name} must be a non-negative number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Check that `value` lies in the half-open interval `(0, 1]`.
pub(crate) fn check_unit_fraction(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SettingsError::FractionOutOfRange {
            name,
            range: "(0, 1]",
            value,
        })
    }
}

/// Check that `value` is not NaN and not negative. Infinity is allowed.
pub(crate) fn check_threshold(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::InvalidThreshold { name, value })
    }
}

pub(crate) fn check_count(name: &'static str, value: usize) -> Result<(), SettingsError> {
    if value == 0 {
        Err(SettingsError::ZeroCount { name })
    } else {
        Ok(())
    }
}
