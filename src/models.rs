//! Reference model types.
//!
//! The estimators are generic over the model; [`Line2D`] is provided so the
//! crate can be exercised end to end (see [`estimators::line`](crate::estimators::line)).

use nalgebra::Vector3;

/// 2D line `a*x + b*y + c = 0` with `a^2 + b^2 = 1`.
///
/// The sign is fixed so that the larger of `|a|` and `|b|` is positive (`b` on a
/// tie), which makes the parameter vector unique for a given line and
/// continuous as the line turns through horizontal or vertical.
#[derive(Clone, Debug, PartialEq)]
pub struct Line2D {
    pub params: Vector3<f64>,
}

impl Default for Line2D {
    /// The x axis.
    fn default() -> Self {
        Self {
            params: Vector3::new(0.0, 1.0, 0.0),
        }
    }
}

impl Line2D {
    /// Build a line from unnormalized coefficients.
    ///
    /// Returns `None` if `(a, b)` is (numerically) zero.
    pub fn new(a: f64, b: f64, c: f64) -> Option<Self> {
        let mut line = Self::default();
        line.set(a, b, c).then_some(line)
    }

    /// Overwrite the coefficients in place, normalizing them.
    ///
    /// Returns `false` and leaves the line untouched if `(a, b)` is
    /// (numerically) zero.
    pub fn set(&mut self, a: f64, b: f64, c: f64) -> bool {
        let norm = (a * a + b * b).sqrt();
        if !(norm > 1e-10) {
            return false;
        }
        let dominant = if b.abs() >= a.abs() { b } else { a };
        let sign = if dominant < 0.0 { -1.0 } else { 1.0 };
        self.params = Vector3::new(a, b, c) * (sign / norm);
        true
    }

    /// Signed distance of `(x, y)` to the line.
    pub fn signed_distance(&self, x: f64, y: f64) -> f64 {
        self.params[0] * x + self.params[1] * y + self.params[2]
    }

    /// `(slope, intercept)` of `y = slope * x + intercept`, or `None` for a
    /// vertical line.
    pub fn to_slope_intercept(&self) -> Option<(f64, f64)> {
        let (a, b, c) = (self.params[0], self.params[1], self.params[2]);
        if b.abs() < 1e-12 {
            return None;
        }
        Some((-a / b, -c / b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn coefficients_are_normalized_and_sign_fixed() {
        let line = Line2D::new(-3.0, -4.0, 10.0).unwrap();
        assert_relative_eq!(line.params[0], 0.6);
        assert_relative_eq!(line.params[1], 0.8);
        assert_relative_eq!(line.params[2], -2.0);

        let same = Line2D::new(6.0, 8.0, -20.0).unwrap();
        assert_relative_eq!(line.params, same.params, epsilon = 1e-12);
    }

    #[test]
    fn near_horizontal_lines_keep_their_sign() {
        // Slopes of opposite sign around y = 5.
        let up = Line2D::new(1e-9, -1.0, 5.0).unwrap();
        let down = Line2D::new(-1e-9, -1.0, 5.0).unwrap();
        assert!(up.params[1] > 0.0 && down.params[1] > 0.0);
        assert!((up.params - down.params).lp_norm(1) < 1e-8);

        let steep = Line2D::new(-1.0, 1e-9, 2.0).unwrap();
        assert_relative_eq!(steep.params[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(steep.params[2], -2.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_coefficients_are_rejected() {
        assert!(Line2D::new(0.0, 0.0, 1.0).is_none());

        let mut line = Line2D::default();
        assert!(!line.set(0.0, 0.0, 5.0));
        assert_eq!(line, Line2D::default());
    }

    #[test]
    fn slope_intercept_round_trip() {
        // y = 2x + 1  <=>  2x - y + 1 = 0
        let line = Line2D::new(2.0, -1.0, 1.0).unwrap();
        let (m, q) = line.to_slope_intercept().unwrap();
        assert_relative_eq!(m, 2.0, epsilon = 1e-12);
        assert_relative_eq!(q, 1.0, epsilon = 1e-12);
        assert_relative_eq!(line.signed_distance(3.0, 7.0), 0.0, epsilon = 1e-12);

        let vertical = Line2D::new(1.0, 0.0, -4.0).unwrap();
        assert!(vertical.to_slope_intercept().is_none());
    }
}
