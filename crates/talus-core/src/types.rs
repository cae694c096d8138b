//! Small shared value types.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Whether the stack solves for a velocity or an acceleration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// First-order: the command is a configuration velocity.
    Velocity,
    /// Second-order: the command is a configuration acceleration, with
    /// velocity feed-forward applied to every task target.
    Acceleration,
}

impl Default for ControlMode {
    fn default() -> Self {
        Self::Velocity
    }
}

/// Convex support footprint of a contact, as an ordered 2D point list.
///
/// The solver treats a contact purely as a zero-velocity equality; the
/// polygon is carried for an external balance/ZMP consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportPolygon {
    points: Vec<[f64; 2]>,
}

impl SupportPolygon {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> impl Iterator<Item = Point2<f64>> + '_ {
        self.points.iter().map(|p| Point2::new(p[0], p[1]))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean of the vertices. Zero for an empty polygon.
    pub fn centroid(&self) -> Point2<f64> {
        if self.points.is_empty() {
            return Point2::origin();
        }
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
        let n = self.points.len() as f64;
        Point2::new(sx / n, sy / n)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn control_mode_default_is_velocity() {
        assert_eq!(ControlMode::default(), ControlMode::Velocity);
    }

    #[test]
    fn support_polygon_centroid() {
        // Rectangular footprint similar to a humanoid sole
        let poly = SupportPolygon::new(vec![
            [0.11, -0.045],
            [-0.08, -0.045],
            [-0.08, 0.07],
            [0.11, 0.07],
        ]);
        let c = poly.centroid();
        assert_relative_eq!(c.x, 0.015, epsilon = 1e-12);
        assert_relative_eq!(c.y, 0.0125, epsilon = 1e-12);
        assert_eq!(poly.len(), 4);
    }

    #[test]
    fn support_polygon_empty_centroid_is_origin() {
        let poly = SupportPolygon::new(Vec::new());
        assert!(poly.is_empty());
        assert_relative_eq!(poly.centroid().x, 0.0);
    }

    #[test]
    fn support_polygon_points_iterate_in_order() {
        let poly = SupportPolygon::new(vec![[1.0, 2.0], [3.0, 4.0]]);
        let pts: Vec<_> = poly.points().collect();
        assert_eq!(pts.len(), 2);
        assert_relative_eq!(pts[1].x, 3.0);
        assert_relative_eq!(pts[1].y, 4.0);
    }
}
