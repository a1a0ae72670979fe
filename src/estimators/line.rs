//! 2D line fitting capabilities.
//!
//! Points are [`Point2<f64>`]; the model is [`Line2D`]. Residuals are absolute
//! orthogonal distances.

use nalgebra::{Matrix2, Point2, SymmetricEigen};

use crate::core::{DistanceFromModel, ModelCodec, ModelGenerator, ModelManager};
use crate::models::Line2D;

/// Creates and copies [`Line2D`] instances.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineManager;

impl ModelManager<Line2D> for LineManager {
    fn create_model(&self) -> Line2D {
        Line2D::default()
    }

    fn copy_model(&self, src: &Line2D, dst: &mut Line2D) {
        dst.params.copy_from(&src.params);
    }
}

/// Fits a line through two points exactly, or through more points by total
/// least squares.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineGenerator;

impl LineGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Line through `p` and `q`: the cross product of their homogeneous
    /// coordinates.
    fn fit_two(p: &Point2<f64>, q: &Point2<f64>, model: &mut Line2D) -> bool {
        let a = p.y - q.y;
        let b = q.x - p.x;
        let c = p.x * q.y - q.x * p.y;
        model.set(a, b, c)
    }

    /// Minimizes the sum of squared orthogonal distances: the normal is the
    /// eigenvector of the scatter matrix with the smallest eigenvalue and the
    /// line passes through the centroid.
    fn fit_many(points: &[Point2<f64>], model: &mut Line2D) -> bool {
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        let (cx, cy) = (sx / n, sy / n);

        let mut scatter = Matrix2::<f64>::zeros();
        for p in points {
            let (dx, dy) = (p.x - cx, p.y - cy);
            scatter[(0, 0)] += dx * dx;
            scatter[(0, 1)] += dx * dy;
            scatter[(1, 1)] += dy * dy;
        }
        scatter[(1, 0)] = scatter[(0, 1)];

        // All points coincide.
        if scatter.trace() < 1e-20 {
            return false;
        }

        let eigen = SymmetricEigen::new(scatter);
        let smallest = eigen.eigenvalues.imin();
        let normal = eigen.eigenvectors.column(smallest);
        let (a, b) = (normal[0], normal[1]);
        model.set(a, b, -(a * cx + b * cy))
    }
}

impl ModelGenerator<Line2D, Point2<f64>> for LineGenerator {
    fn min_points(&self) -> usize {
        2
    }

    fn generate(&mut self, points: &[Point2<f64>], model: &mut Line2D) -> bool {
        match points {
            [] | [_] => false,
            [p, q] => Self::fit_two(p, q, model),
            _ => Self::fit_many(points, model),
        }
    }
}

/// Absolute orthogonal distance to the bound line.
#[derive(Clone, Debug, Default)]
pub struct LineDistance {
    line: Line2D,
}

impl DistanceFromModel<Line2D, Point2<f64>> for LineDistance {
    fn set_model(&mut self, model: &Line2D) {
        self.line.params.copy_from(&model.params);
    }

    fn distance(&self, point: &Point2<f64>) -> f64 {
        self.line.signed_distance(point.x, point.y).abs()
    }
}

/// Encodes a line as its three normalized coefficients `(a, b, c)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineCodec;

impl ModelCodec<Line2D> for LineCodec {
    fn param_len(&self) -> usize {
        3
    }

    fn encode(&self, model: &Line2D, params: &mut [f64]) {
        params[..3].copy_from_slice(model.params.as_slice());
    }

    fn decode(&self, params: &[f64], model: &mut Line2D) {
        // Encoded lines are already normalized; this only fails on garbage.
        if !model.set(params[0], params[1], params[2]) {
            model.params.copy_from_slice(&params[..3]);
        }
    }
}
