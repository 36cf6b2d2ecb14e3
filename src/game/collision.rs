//! Collision Detection
//!
//! Axis-aligned rectangle primitives shared by player movement and bullets.
//! Bodies are separated one axis at a time: horizontal first, then vertical
//! against the already-corrected x position.

use serde::{Serialize, Deserialize};

/// Axis-aligned rectangle. `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center x.
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Center y.
    #[inline]
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// Strict overlap test. Touching edges do not intersect.
#[inline]
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// Resolve x-overlaps after a horizontal move.
///
/// Each overlapping platform clamps `rect.x` to the edge the body entered
/// from (based on the sign of `vx`) and zeroes `vx`.
pub fn resolve_horizontal(rect: &mut Rect, vx: &mut f32, platforms: &[Rect]) {
    for p in platforms {
        if intersects(rect, p) {
            if *vx > 0.0 {
                rect.x = p.x - rect.width;
            } else if *vx < 0.0 {
                rect.x = p.right();
            }
            *vx = 0.0;
        }
    }
}

/// Resolve y-overlaps after a vertical move.
///
/// Returns true when the body landed on top of a platform this pass.
pub fn resolve_vertical(rect: &mut Rect, vy: &mut f32, platforms: &[Rect]) -> bool {
    let mut landed = false;
    for p in platforms {
        if intersects(rect, p) {
            if *vy > 0.0 {
                rect.y = p.y - rect.height;
                landed = true;
            } else if *vy < 0.0 {
                rect.y = p.bottom();
            }
            *vy = 0.0;
        }
    }
    landed
}

/// Reflect a moving rectangle off the first platform it overlaps.
///
/// The velocity component on the axis of smaller penetration is flipped and
/// the rectangle is pushed out along that axis. Returns true if a platform
/// was hit.
pub fn bounce_off(rect: &mut Rect, vx: &mut f32, vy: &mut f32, platforms: &[Rect]) -> bool {
    for p in platforms {
        if intersects(rect, p) {
            let overlap_x = (rect.width / 2.0 + p.width / 2.0) - (rect.center_x() - p.center_x()).abs();
            let overlap_y = (rect.height / 2.0 + p.height / 2.0) - (rect.center_y() - p.center_y()).abs();

            if overlap_x < overlap_y {
                *vx = -*vx;
                rect.x += if *vx > 0.0 { overlap_x } else { -overlap_x };
            } else {
                *vy = -*vy;
                rect.y += if *vy > 0.0 { overlap_y } else { -overlap_y };
            }
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let c = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!intersects(&a, &b));
        assert!(!intersects(&a, &c));
        assert!(intersects(&a, &Rect::new(9.5, 9.5, 1.0, 1.0)));
    }

    #[test]
    fn test_horizontal_clamps_to_entered_edge() {
        let wall = [Rect::new(100.0, 0.0, 20.0, 200.0)];

        let mut moving_right = Rect::new(65.0, 50.0, 40.0, 40.0);
        let mut vx = 5.0;
        resolve_horizontal(&mut moving_right, &mut vx, &wall);
        assert_eq!(moving_right.x, 60.0);
        assert_eq!(vx, 0.0);

        let mut moving_left = Rect::new(115.0, 50.0, 40.0, 40.0);
        let mut vx = -5.0;
        resolve_horizontal(&mut moving_left, &mut vx, &wall);
        assert_eq!(moving_left.x, 120.0);
        assert_eq!(vx, 0.0);
    }

    #[test]
    fn test_vertical_landing_sets_flag() {
        let floor = [Rect::new(0.0, 100.0, 500.0, 20.0)];

        let mut falling = Rect::new(10.0, 62.0, 40.0, 40.0);
        let mut vy = 3.0;
        assert!(resolve_vertical(&mut falling, &mut vy, &floor));
        assert_eq!(falling.y, 60.0);
        assert_eq!(vy, 0.0);

        // Hitting the underside stops but does not land
        let mut rising = Rect::new(10.0, 118.0, 40.0, 40.0);
        let mut vy = -3.0;
        assert!(!resolve_vertical(&mut rising, &mut vy, &floor));
        assert_eq!(rising.y, 120.0);
    }

    #[test]
    fn test_bounce_off_side_wall_flips_vx() {
        let wall = [Rect::new(100.0, 0.0, 20.0, 400.0)];
        let mut bullet = Rect::new(96.0, 200.0, 8.0, 8.0);
        let (mut vx, mut vy) = (12.0, 1.0);

        assert!(bounce_off(&mut bullet, &mut vx, &mut vy, &wall));
        assert_eq!(vx, -12.0);
        assert_eq!(vy, 1.0);
        assert!(!intersects(&bullet, &wall[0]));
    }

    #[test]
    fn test_bounce_off_floor_flips_vy() {
        let floor = [Rect::new(0.0, 300.0, 600.0, 20.0)];
        let mut bullet = Rect::new(200.0, 296.0, 8.0, 8.0);
        let (mut vx, mut vy) = (2.0, 6.0);

        assert!(bounce_off(&mut bullet, &mut vx, &mut vy, &floor));
        assert_eq!(vx, 2.0);
        assert_eq!(vy, -6.0);
        assert!(!intersects(&bullet, &floor[0]));
    }

    #[test]
    fn test_bounce_off_misses() {
        let floor = [Rect::new(0.0, 300.0, 600.0, 20.0)];
        let mut bullet = Rect::new(200.0, 100.0, 8.0, 8.0);
        let (mut vx, mut vy) = (2.0, 6.0);
        assert!(!bounce_off(&mut bullet, &mut vx, &mut vy, &floor));
    }
}
