//! Model capabilities shipped with the crate.
//!
//! Each submodule implements the [`core`](crate::core) traits for one model:
//! - Line fitting in 2D

pub mod line;

pub use line::{LineCodec, LineDistance, LineGenerator, LineManager};
