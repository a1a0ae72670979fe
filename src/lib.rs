//! # robustfit - Robust Model Matching
//!
//! `robustfit` fits a parametric model to data contaminated with outliers and
//! reports which points are consistent with it. The estimators are generic: they
//! never look inside a model or a point, everything model-specific comes from a
//! handful of capability traits.
//!
//! ## Estimators
//!
//! - [`Ransac`]: maximum consensus under a fixed residual threshold.
//! - [`LeastMedianOfSquares`]: minimizes a generalized median of the residuals.
//! - [`LeastMedianOfSquaresConcurrent`]: the same search spread over a worker
//!   pool, with results identical to the sequential estimator.
//! - [`StatisticalDistanceMatcher`]: refits to all points and prunes the ones
//!   far from the bulk until the fit settles.
//!
//! All of them implement [`ModelMatcher`].
//!
//! ## Quick Start
//!
//! ```rust
//! use nalgebra::Point2;
//! use robustfit::estimators::{LineDistance, LineGenerator, LineManager};
//! use robustfit::{ModelMatcher, Ransac, RansacSettings};
//!
//! // y = 2x + 1, with one gross outlier.
//! let mut points: Vec<_> = (0..20)
//!     .map(|i| Point2::new(i as f64, 2.0 * i as f64 + 1.0))
//!     .collect();
//! points.push(Point2::new(5.0, -40.0));
//!
//! let settings = RansacSettings {
//!     inlier_threshold: 0.1,
//!     ..Default::default()
//! };
//! let mut ransac =
//!     Ransac::new(settings, LineManager, LineGenerator, LineDistance::default()).unwrap();
//!
//! assert!(ransac.process(&points));
//! assert_eq!(ransac.match_set().len(), 20);
//! ```
//!
//! ## Extending the Library
//!
//! Plug in a new model by implementing:
//!
//! - **[`ModelManager<M>`](core::ModelManager)**: create and copy model instances
//! - **[`ModelGenerator<M, P>`](core::ModelGenerator)**: fit a model to a set of points
//! - **[`DistanceFromModel<M, P>`](core::DistanceFromModel)**: residual of a point
//! - **[`ModelCodec<M>`](core::ModelCodec)**: flatten a model to parameters
//!   (statistical matcher only)
//!
//! ```rust
//! use robustfit::core::{DistanceFromModel, ModelGenerator, ModelManager};
//!
//! /// A constant: the model of a 1D cluster.
//! struct Level(f64);
//!
//! struct LevelManager;
//!
//! impl ModelManager<Level> for LevelManager {
//!     fn create_model(&self) -> Level {
//!         Level(0.0)
//!     }
//!
//!     fn copy_model(&self, src: &Level, dst: &mut Level) {
//!         dst.0 = src.0;
//!     }
//! }
//!
//! struct LevelGenerator;
//!
//! impl ModelGenerator<Level, f64> for LevelGenerator {
//!     fn min_points(&self) -> usize {
//!         1
//!     }
//!
//!     fn generate(&mut self, points: &[f64], model: &mut Level) -> bool {
//!         model.0 = points.iter().sum::<f64>() / points.len() as f64;
//!         true
//!     }
//! }
//!
//! struct LevelDistance(f64);
//!
//! impl DistanceFromModel<Level, f64> for LevelDistance {
//!     fn set_model(&mut self, model: &Level) {
//!         self.0 = model.0;
//!     }
//!
//!     fn distance(&self, point: &f64) -> f64 {
//!         (point - self.0).abs()
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - **[`core`](core)**: Capability traits and the common estimator surface
//! - **[`ransac`](ransac)**, **[`lmeds`](lmeds)**,
//!   **[`lmeds_concurrent`](lmeds_concurrent)**,
//!   **[`statistical`](statistical)**: The estimators
//! - **[`samplers`](samplers)**: Random subset selection
//! - **[`context`](context)**: Per-trial scratch state
//! - **[`parallel`](parallel)**: Worker pool for concurrent trials
//! - **[`estimators`](estimators)**: Built-in model capabilities (2D line)
//! - **[`models`](models)**: Reference model types
//! - **[`settings`](settings)**: Configuration types

pub mod context;
pub mod core;
pub mod errors;
pub mod estimators;
pub mod lmeds;
pub mod lmeds_concurrent;
pub mod models;
pub mod parallel;
pub mod ransac;
pub mod samplers;
pub mod settings;
pub mod statistical;
pub mod types;
pub mod utils;

// Re-export the estimators
pub use lmeds::LeastMedianOfSquares;
pub use lmeds_concurrent::LeastMedianOfSquaresConcurrent;
pub use ransac::Ransac;
pub use statistical::StatisticalDistanceMatcher;

// Re-export core traits for easy access
pub use crate::core::{DistanceFromModel, ModelCodec, ModelGenerator, ModelManager, ModelMatcher};

pub use errors::SettingsError;
pub use settings::{
    ConcurrencySettings, LmedsSettings, RansacSettings, ResidualStatistic, StatisticalSettings,
};
