//! Arena Geometry
//!
//! Five fixed arenas of static platforms on a 1200x800 canvas. The arena for
//! a round is picked by `(round - 1) % ARENA_COUNT` so both peers agree on
//! the layout without exchanging it.

use crate::core::vec2::Vec2;
use crate::game::collision::Rect;

/// A static platform.
pub type Platform = Rect;

/// Canvas width in pixels.
pub const ARENA_WIDTH: f32 = 1200.0;

/// Canvas height in pixels.
pub const ARENA_HEIGHT: f32 = 800.0;

/// Number of built-in arenas.
pub const ARENA_COUNT: usize = 5;

/// Names of the built-in arenas, indexed like [`arena`].
pub const ARENA_NAMES: [&str; ARENA_COUNT] = [
    "Classic Arena",
    "The Cage",
    "Floating Islands",
    "The Pit",
    "Verticality",
];

const GROUND: Platform = Rect::new(0.0, 760.0, 1200.0, 40.0);
const LEFT_WALL: Platform = Rect::new(0.0, 0.0, 40.0, 800.0);
const RIGHT_WALL: Platform = Rect::new(1160.0, 0.0, 40.0, 800.0);
const CEILING: Platform = Rect::new(0.0, 0.0, 1200.0, 40.0);

/// Platforms for arena `index` (wraps around).
pub fn arena(index: usize) -> Vec<Platform> {
    let mut platforms = match index % ARENA_COUNT {
        0 => vec![
            Rect::new(100.0, 500.0, 300.0, 20.0),
            Rect::new(800.0, 500.0, 300.0, 20.0),
            Rect::new(450.0, 300.0, 300.0, 20.0),
            GROUND,
        ],
        1 => vec![
            Rect::new(200.0, 200.0, 20.0, 400.0),
            Rect::new(980.0, 200.0, 20.0, 400.0),
            Rect::new(300.0, 400.0, 600.0, 20.0),
            GROUND,
        ],
        // No ground: falling off is fatal
        2 => vec![
            Rect::new(200.0, 600.0, 200.0, 20.0),
            Rect::new(800.0, 600.0, 200.0, 20.0),
            Rect::new(100.0, 300.0, 200.0, 20.0),
            Rect::new(900.0, 300.0, 200.0, 20.0),
            Rect::new(500.0, 450.0, 200.0, 20.0),
        ],
        3 => vec![
            Rect::new(0.0, 300.0, 300.0, 20.0),
            Rect::new(900.0, 300.0, 300.0, 20.0),
            Rect::new(0.0, 600.0, 200.0, 20.0),
            Rect::new(1000.0, 600.0, 200.0, 20.0),
            Rect::new(550.0, 700.0, 100.0, 20.0),
        ],
        _ => vec![
            Rect::new(300.0, 650.0, 600.0, 20.0),
            Rect::new(100.0, 500.0, 150.0, 20.0),
            Rect::new(950.0, 500.0, 150.0, 20.0),
            Rect::new(200.0, 350.0, 150.0, 20.0),
            Rect::new(850.0, 350.0, 150.0, 20.0),
            Rect::new(550.0, 200.0, 100.0, 20.0),
            GROUND,
        ],
    };

    platforms.extend([LEFT_WALL, RIGHT_WALL, CEILING]);
    platforms
}

/// Arena index for a 1-based round number.
pub fn arena_index_for_round(round: u32) -> usize {
    (round.max(1) as usize - 1) % ARENA_COUNT
}

/// Platforms for a 1-based round number.
pub fn arena_for_round(round: u32) -> Vec<Platform> {
    arena(arena_index_for_round(round))
}

/// Spawn positions (top-left) for p1 and p2.
pub fn spawn_points() -> (Vec2, Vec2) {
    (Vec2::new(100.0, 200.0), Vec2::new(ARENA_WIDTH - 140.0, 200.0))
}
