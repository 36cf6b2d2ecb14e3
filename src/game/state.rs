//! Simulation State
//!
//! Everything the tick mutates lives in one owned [`SimulationState`]. The
//! renderer only ever sees a borrowed [`FrameView`].

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::core::rng::DeterministicRng;
use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::game::collision::Rect;
use crate::game::events::GameEvent;
use crate::game::map::{self, Platform};
use crate::game::stats::PlayerStats;

/// One of the two players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Player 1 (host / left spawn)
    P1,
    /// Player 2 (client / right spawn)
    P2,
}

impl Side {
    /// Both sides in win-check order.
    pub const ALL: [Side; 2] = [Side::P1, Side::P2];

    /// The other player.
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::P1 => Side::P2,
            Side::P2 => Side::P1,
        }
    }

    /// Stable numeric id for hashing.
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Side::P1 => 0,
            Side::P2 => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::P1 => write!(f, "p1"),
            Side::P2 => write!(f, "p2"),
        }
    }
}

// =============================================================================
// PLAYER BODY
// =============================================================================

/// Kinematic and combat state of one player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    /// Which player this is
    pub side: Side,
    /// Top-left corner
    pub position: Vec2,
    /// Velocity (pixels per tick)
    pub velocity: Vec2,
    /// Body width (from stats)
    pub width: f32,
    /// Body height (from stats)
    pub height: f32,
    /// +1 facing right, -1 facing left
    pub facing: i8,
    /// Aim angle in radians
    pub aim_angle: f32,
    /// Current health, never below zero
    pub health: f32,
    /// Rounds left in the magazine
    pub ammo: u32,
    /// Ticks until the next shot is allowed (may go slightly negative)
    pub shoot_cooldown: f32,
    /// Ticks left on the current reload (0 = not reloading)
    pub reload_timer: u32,
    /// Landed on a platform this tick
    pub on_ground: bool,
    /// A jump is available (reset on landing)
    pub can_jump: bool,
    /// Cosmetic walk-cycle phase
    pub walk_phase: f32,
    /// Resolved stats for this round
    pub stats: PlayerStats,
}

impl PhysicsBody {
    /// Create a body at its spawn point with full health and ammo.
    pub fn new(side: Side, position: Vec2, stats: PlayerStats) -> Self {
        let (facing, aim_angle) = match side {
            Side::P1 => (1, 0.0),
            Side::P2 => (-1, std::f32::consts::PI),
        };

        Self {
            side,
            position,
            velocity: Vec2::ZERO,
            width: stats.width,
            height: stats.height,
            facing,
            aim_angle,
            health: stats.max_health,
            ammo: stats.max_ammo,
            shoot_cooldown: 0.0,
            reload_timer: 0,
            on_ground: false,
            can_jump: true,
            walk_phase: 0.0,
            stats,
        }
    }

    /// Bounding rectangle.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    /// Body center.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }

    /// Maximum health for this round.
    #[inline]
    pub fn max_health(&self) -> f32 {
        self.stats.max_health
    }

    /// Health has reached zero.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Reloading blocks firing.
    #[inline]
    pub fn is_reloading(&self) -> bool {
        self.reload_timer > 0
    }

    /// Subtract health, clamping at zero. Returns the new health.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        self.health = (self.health - amount).max(0.0);
        self.health
    }

    /// Add health, capped at max health. Returns the amount actually healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health());
        self.health - before
    }

    /// Point the body at `angle` and update facing.
    pub fn set_aim(&mut self, angle: f32) {
        self.aim_angle = angle;
        self.facing = if angle.cos() > 0.0 { 1 } else { -1 };
    }

    /// Hash this body into a state hasher.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.write_u8(self.side.index());
        hasher.write_vec2(self.position);
        hasher.write_vec2(self.velocity);
        hasher.write_f32(self.width);
        hasher.write_f32(self.height);
        hasher.write_u8(self.facing as u8);
        hasher.write_f32(self.aim_angle);
        hasher.write_f32(self.health);
        hasher.write_u32(self.ammo);
        hasher.write_f32(self.shoot_cooldown);
        hasher.write_u32(self.reload_timer);
        hasher.write_bool(self.on_ground);
        hasher.write_bool(self.can_jump);
        hasher.write_f32(self.walk_phase);
    }
}

// =============================================================================
// PROJECTILES AND PARTICLES
// =============================================================================

/// A live bullet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Unique id within the round
    pub id: u32,
    /// Shooter
    pub owner: Side,
    /// Player this bullet can hit (and homes towards)
    pub target: Side,
    /// Top-left corner
    pub position: Vec2,
    /// Velocity (pixels per tick)
    pub velocity: Vec2,
    /// Edge length
    pub size: f32,
    /// Damage on hit
    pub damage: f32,
    /// Wall reflections left; removed after a wall contact drops this below zero
    pub bounces_left: i32,
    /// Ticks left to live
    pub lifetime: i32,
    /// Explodes on hit or on a wall-contact removal
    pub explosive: bool,
    /// Explosion radius
    pub explosive_radius: f32,
    /// Knockback impulse
    pub knockback: f32,
    /// Homing steering fraction
    pub homing: f32,
}

impl Projectile {
    /// Bounding rectangle.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size, self.size)
    }

    /// Bullet center.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.size / 2.0,
            self.position.y + self.size / 2.0,
        )
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.write_u32(self.id);
        hasher.write_u8(self.owner.index());
        hasher.write_vec2(self.position);
        hasher.write_vec2(self.velocity);
        hasher.write_f32(self.damage);
        hasher.write_i32(self.bounces_left);
        hasher.write_i32(self.lifetime);
    }
}

/// What spawned a particle. The renderer picks colors from this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Bullet struck a player (owner's bullet color)
    Impact(Side),
    /// Bullet expired or broke on a wall
    Fizzle(Side),
    /// Explosion fireball
    Explosion,
    /// Jump dust
    Dust,
    /// Death burst (victim's color)
    Death(Side),
}

/// A cosmetic particle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Position
    pub position: Vec2,
    /// Velocity
    pub velocity: Vec2,
    /// Ticks left
    pub life: f32,
    /// Life at full opacity
    pub max_life: f32,
    /// Opacity, life / max_life
    pub alpha: f32,
    /// Source
    pub kind: ParticleKind,
}

// =============================================================================
// SIMULATION STATE
// =============================================================================

/// Complete state of one round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationState {
    /// Ticks simulated this round
    pub tick: u32,
    /// 1-based round number (selects the arena)
    pub round: u32,
    /// Player 1
    pub p1: PhysicsBody,
    /// Player 2
    pub p2: PhysicsBody,
    /// Live bullets
    pub projectiles: Vec<Projectile>,
    /// Live particles
    pub particles: Vec<Particle>,
    /// Static geometry
    pub platforms: Vec<Platform>,
    /// Cosmetic camera shake magnitude
    pub screen_shake: f32,
    /// Latched once a player's health reaches zero
    pub round_ended: bool,
    /// Seed the RNG was created from
    pub rng_seed: u64,
    /// Particle and scatter RNG
    pub rng: DeterministicRng,
    /// Next bullet id
    pub next_projectile_id: u32,
    /// Events produced since the last `take_events`
    #[serde(skip)]
    pending_events: Vec<GameEvent>,
}

impl SimulationState {
    /// Set up a round: arena by round number, both players at their spawns.
    pub fn new_round(round: u32, p1_stats: PlayerStats, p2_stats: PlayerStats, rng_seed: u64) -> Self {
        Self::with_platforms(map::arena_for_round(round), round, p1_stats, p2_stats, rng_seed)
    }

    /// Set up a round on custom geometry.
    pub fn with_platforms(
        platforms: Vec<Platform>,
        round: u32,
        p1_stats: PlayerStats,
        p2_stats: PlayerStats,
        rng_seed: u64,
    ) -> Self {
        let (p1_spawn, p2_spawn) = map::spawn_points();

        Self {
            tick: 0,
            round,
            p1: PhysicsBody::new(Side::P1, p1_spawn, p1_stats),
            p2: PhysicsBody::new(Side::P2, p2_spawn, p2_stats),
            projectiles: Vec::new(),
            particles: Vec::new(),
            platforms,
            screen_shake: 0.0,
            round_ended: false,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            next_projectile_id: 0,
            pending_events: Vec::new(),
        }
    }

    /// Borrow a body.
    pub fn body(&self, side: Side) -> &PhysicsBody {
        match side {
            Side::P1 => &self.p1,
            Side::P2 => &self.p2,
        }
    }

    /// Mutably borrow a body.
    pub fn body_mut(&mut self, side: Side) -> &mut PhysicsBody {
        match side {
            Side::P1 => &mut self.p1,
            Side::P2 => &mut self.p2,
        }
    }

    /// Allocate a projectile id.
    pub fn next_projectile_id(&mut self) -> u32 {
        let id = self.next_projectile_id;
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        id
    }

    /// Add to camera shake.
    #[inline]
    pub fn add_shake(&mut self, amount: f32) {
        self.screen_shake += amount;
    }

    /// Read-only view for the renderer.
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            tick: self.tick,
            round: self.round,
            p1: &self.p1,
            p2: &self.p2,
            projectiles: &self.projectiles,
            particles: &self.particles,
            platforms: &self.platforms,
            screen_shake: self.screen_shake,
            round_ended: self.round_ended,
        }
    }

    /// Compute hash of gameplay state.
    ///
    /// Particles are cosmetic and not hashed directly; the RNG state that
    /// scattered them is.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            hasher.write_u32(self.round);
            self.p1.hash_into(hasher);
            self.p2.hash_into(hasher);

            hasher.write_u32(self.projectiles.len() as u32);
            for projectile in &self.projectiles {
                projectile.hash_into(hasher);
            }

            hasher.write_u32(self.particles.len() as u32);
            let [s0, s1] = self.rng.state();
            hasher.write_u64(s0);
            hasher.write_u64(s1);

            hasher.write_f32(self.screen_shake);
            hasher.write_bool(self.round_ended);
            hasher.write_u32(self.next_projectile_id);
        })
    }

    /// Drain events produced since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Record an event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

/// Read-only borrow of a frame for rendering.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    /// Tick number
    pub tick: u32,
    /// Round number
    pub round: u32,
    /// Player 1
    pub p1: &'a PhysicsBody,
    /// Player 2
    pub p2: &'a PhysicsBody,
    /// Bullets
    pub projectiles: &'a [Projectile],
    /// Particles
    pub particles: &'a [Particle],
    /// Platforms
    pub platforms: &'a [Platform],
    /// Camera shake
    pub screen_shake: f32,
    /// Round decided
    pub round_ended: bool,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SimulationState {
        SimulationState::new_round(1, PlayerStats::default(), PlayerStats::default(), 42)
    }

    #[test]
    fn test_spawn_layout() {
        let s = state();
        assert_eq!(s.p1.position, Vec2::new(100.0, 200.0));
        assert_eq!(s.p2.position, Vec2::new(1060.0, 200.0));
        assert_eq!(s.p1.facing, 1);
        assert_eq!(s.p2.facing, -1);
        assert_eq!(s.p1.ammo, 5);
        assert_eq!(s.p2.health, 100.0);
        assert!(s.p1.can_jump);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut s = state();
        assert_eq!(s.p1.take_damage(30.0), 70.0);
        assert_eq!(s.p1.take_damage(500.0), 0.0);
        assert!(s.p1.is_dead());
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut s = state();
        s.p2.take_damage(10.0);
        assert_eq!(s.p2.heal(25.0), 10.0);
        assert_eq!(s.p2.health, 100.0);
    }

    #[test]
    fn test_hash_tracks_changes() {
        let a = state();
        let mut b = state();
        assert_eq!(a.compute_hash(), b.compute_hash());

        b.p1.velocity.x = 0.5;
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_events_drain() {
        let mut s = state();
        s.push_event(GameEvent::jumped(0, Side::P1));
        assert_eq!(s.take_events().len(), 1);
        assert!(s.take_events().is_empty());
    }
}
