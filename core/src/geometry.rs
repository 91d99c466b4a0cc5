//! Pure geometry kernel used by the world queries, the pathfinder and roles.
//!
//! Angles are expressed in degrees and normalised into `[0, 360)`. Degenerate
//! zero-length vectors resolve to an angle of zero rather than failing.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Circle on the field. A radius of zero describes a bare point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    x: f64,
    y: f64,
    radius: f64,
}

impl Circle {
    /// Creates a circle centred on `(x, y)`.
    #[must_use]
    pub const fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    /// Creates a radius-zero point.
    #[must_use]
    pub const fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0)
    }

    /// Creates a circle from a centre vector.
    #[must_use]
    pub fn from_center(center: DVec2, radius: f64) -> Self {
        Self::new(center.x, center.y, radius)
    }

    /// Horizontal coordinate of the centre.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Vertical coordinate of the centre.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Radius of the circle.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Centre of the circle as a vector.
    #[must_use]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Returns a copy of the circle with a different radius.
    #[must_use]
    pub const fn with_radius(self, radius: f64) -> Self {
        Self::new(self.x, self.y, radius)
    }
}

/// Centre-to-centre distance between two circles.
#[must_use]
pub fn distance(a: Circle, b: Circle) -> f64 {
    a.center().distance(b.center())
}

/// Bearing in degrees from `from` toward `to`.
#[must_use]
pub fn bearing(from: Circle, to: Circle) -> f64 {
    angle_of(to.center() - from.center())
}

/// Angle of a vector in degrees, zero for degenerate vectors.
#[must_use]
pub fn angle_of(vector: DVec2) -> f64 {
    if !vector.is_finite() || vector.length_squared() == 0.0 {
        return 0.0;
    }
    normalize_degrees(vector.y.atan2(vector.x).to_degrees())
}

/// Wraps an angle into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid may round tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Unit vector pointing along the provided angle.
#[must_use]
pub fn heading(angle_degrees: f64) -> DVec2 {
    let radians = angle_degrees.to_radians();
    DVec2::new(radians.cos(), radians.sin())
}

/// Point just outside `target`, on the side facing `from`, kept
/// `min_distance` away from the target's boundary.
#[must_use]
pub fn closest_point_to(from: Circle, target: Circle, min_distance: f64) -> Circle {
    let angle = bearing(target, from);
    let reach = target.radius() + min_distance;
    Circle::from_center(target.center() + heading(angle) * reach, 0.0)
}

/// Reports whether the segment `start..end` passes within `circle.radius + fudge`
/// of the circle's centre.
///
/// Obstacles lying strictly behind `start` never intersect. A zero-length
/// segment degrades to a point-in-circle test.
#[must_use]
pub fn intersects_segment(start: DVec2, end: DVec2, circle: Circle, fudge: f64) -> bool {
    let delta = end - start;
    let length_sq = delta.length_squared();
    let reach = circle.radius() + fudge;
    if length_sq == 0.0 {
        return start.distance(circle.center()) <= reach;
    }

    let t = ((circle.center() - start).dot(delta) / length_sq).min(1.0);
    if t < 0.0 {
        return false;
    }

    let closest = start + delta * t;
    closest.distance(circle.center()) <= reach
}

/// Minimum separation between two points moving linearly over one turn.
#[must_use]
pub fn closest_approach(
    a_start: DVec2,
    a_velocity: DVec2,
    b_start: DVec2,
    b_velocity: DVec2,
) -> f64 {
    let offset = a_start - b_start;
    let relative = a_velocity - b_velocity;
    let speed_sq = relative.length_squared();
    let t = if speed_sq == 0.0 {
        0.0
    } else {
        (-offset.dot(relative) / speed_sq).clamp(0.0, 1.0)
    };
    (offset + relative * t).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn bearing_follows_axes() {
        let origin = Circle::point(0.0, 0.0);
        assert!((bearing(origin, Circle::point(10.0, 0.0)) - 0.0).abs() < EPSILON);
        assert!((bearing(origin, Circle::point(0.0, 10.0)) - 90.0).abs() < EPSILON);
        assert!((bearing(origin, Circle::point(-10.0, 0.0)) - 180.0).abs() < EPSILON);
        assert!((bearing(origin, Circle::point(0.0, -10.0)) - 270.0).abs() < EPSILON);
    }

    #[test]
    fn degenerate_bearing_is_zero() {
        let point = Circle::new(4.0, 4.0, 1.0);
        assert_eq!(bearing(point, point), 0.0);
        assert_eq!(angle_of(DVec2::ZERO), 0.0);
    }

    #[test]
    fn normalize_wraps_negative_angles() {
        assert!((normalize_degrees(-90.0) - 270.0).abs() < EPSILON);
        assert!((normalize_degrees(720.0)).abs() < EPSILON);
        assert!(normalize_degrees(-1e-18) < 360.0);
    }

    #[test]
    fn closest_point_sits_outside_target_boundary() {
        let ship = Circle::new(0.0, 0.0, 0.5);
        let planet = Circle::new(20.0, 0.0, 5.0);
        let point = closest_point_to(ship, planet, 3.0);
        assert!((point.x() - 12.0).abs() < EPSILON);
        assert!(point.y().abs() < EPSILON);
        assert_eq!(point.radius(), 0.0);
    }

    #[test]
    fn segment_hits_circle_on_its_path() {
        let obstacle = Circle::new(5.0, 0.5, 1.0);
        assert!(intersects_segment(
            DVec2::ZERO,
            DVec2::new(10.0, 0.0),
            obstacle,
            0.0
        ));
    }

    #[test]
    fn segment_misses_circle_beside_its_path() {
        let obstacle = Circle::new(5.0, 3.0, 1.0);
        assert!(!intersects_segment(
            DVec2::ZERO,
            DVec2::new(10.0, 0.0),
            obstacle,
            0.5
        ));
        assert!(intersects_segment(
            DVec2::ZERO,
            DVec2::new(10.0, 0.0),
            obstacle,
            2.0
        ));
    }

    #[test]
    fn obstacle_behind_start_does_not_block() {
        let obstacle = Circle::new(-1.0, 0.0, 1.0);
        assert!(!intersects_segment(
            DVec2::ZERO,
            DVec2::new(10.0, 0.0),
            obstacle,
            0.6
        ));
    }

    #[test]
    fn short_segment_uses_endpoint_distance() {
        let obstacle = Circle::new(10.0, 0.0, 1.0);
        assert!(!intersects_segment(
            DVec2::ZERO,
            DVec2::new(5.0, 0.0),
            obstacle,
            0.5
        ));
    }

    #[test]
    fn zero_length_segment_is_a_point_test() {
        let obstacle = Circle::new(1.0, 0.0, 0.5);
        assert!(intersects_segment(DVec2::ZERO, DVec2::ZERO, obstacle, 0.6));
        assert!(!intersects_segment(DVec2::ZERO, DVec2::ZERO, obstacle, 0.4));
    }

    #[test]
    fn closest_approach_detects_crossing_paths() {
        let separation = closest_approach(
            DVec2::new(0.0, 0.0),
            DVec2::new(6.0, 0.0),
            DVec2::new(3.0, -3.0),
            DVec2::new(0.0, 6.0),
        );
        assert!(separation < 0.1);
    }

    #[test]
    fn closest_approach_of_parallel_moves_is_constant() {
        let separation = closest_approach(
            DVec2::new(0.0, 0.0),
            DVec2::new(5.0, 0.0),
            DVec2::new(0.0, 4.0),
            DVec2::new(5.0, 0.0),
        );
        assert!((separation - 4.0).abs() < EPSILON);
    }
}
