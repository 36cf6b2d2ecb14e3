//! 2D Vector and Angle Helpers
//!
//! Small f32 vector type used by every physics and combat routine.
//! Operations are plain IEEE-754 arithmetic in a fixed evaluation order,
//! so identical inputs produce identical bits on both peers.

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use serde::{Serialize, Deserialize};

/// 2D vector in arena pixels (x right, y down).
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians, clockwise on screen).
    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    /// Scale by a scalar.
    #[inline]
    pub fn scale(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    /// Squared length (avoids sqrt - prefer this for comparisons).
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Length (magnitude).
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Heading of this vector in radians, in (-PI, PI].
    #[inline]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Angle from this point towards `target`.
    #[inline]
    pub fn angle_to(self, target: Self) -> f32 {
        (target - self).angle()
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Debug for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec2({:.3}, {:.3})", self.x, self.y)
    }
}

// =============================================================================
// ANGLES
// =============================================================================

/// Wrap an angle into [-PI, PI].
pub fn wrap_angle(mut angle: f32) -> f32 {
    while angle < -PI {
        angle += TAU;
    }
    while angle > PI {
        angle -= TAU;
    }
    angle
}

/// Shortest signed rotation that takes `from` onto `to`.
#[inline]
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Move `from` a fraction `t` of the shortest way towards `to`.
///
/// Never snaps: with `t` in (0, 1) the result always lands strictly between
/// the two headings along the short arc. The result is wrapped, so repeated
/// steps across the seam stay within [-PI, PI].
#[inline]
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    wrap_angle(from + shortest_angle(from, to) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_arithmetic() {
        let a = Vec2::new(3.0, 4.0);
        let b = Vec2::new(1.0, -1.0);

        assert_eq!(a + b, Vec2::new(4.0, 3.0));
        assert_eq!(a - b, Vec2::new(2.0, 5.0));
        assert_eq!(-b, Vec2::new(-1.0, 1.0));
        assert_eq!(a.scale(2.0), Vec2::new(6.0, 8.0));
        assert_eq!(a.length(), 5.0);
        assert_eq!(a.distance(Vec2::ZERO), 5.0);
    }

    #[test]
    fn test_from_angle_round_trip() {
        let v = Vec2::from_angle(0.75);
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!((v.angle() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(-3.0 * PI) + PI).abs() < 1e-5);
        assert_eq!(wrap_angle(0.5), 0.5);
    }

    #[test]
    fn test_shortest_angle_crosses_seam() {
        // From just below +PI to just above -PI is a short positive step.
        let diff = shortest_angle(PI - 0.1, -PI + 0.1);
        assert!((diff - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_lerp_angle_is_bounded() {
        let from = 0.0;
        let to = 1.0;
        let mid = lerp_angle(from, to, 0.15);
        assert!(mid > from && mid < to);
        assert!((mid - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_lerp_angle_stays_wrapped_across_seam() {
        // Chasing a heading just past -PI from just below +PI
        let target = -PI + 0.3;
        let mut heading = PI - 0.2;
        for _ in 0..200 {
            heading = lerp_angle(heading, target, 0.15);
            assert!((-PI..=PI).contains(&heading));
        }
        assert!((heading - target).abs() < 1e-4);
    }
}
