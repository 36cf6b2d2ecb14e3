//! Game Logic Module
//!
//! All game simulation code. Deterministic given the same inputs and seed.
//!
//! ## Module Structure
//!
//! - `stats`: Player stats, card modifiers and their resolution
//! - `cards`: Card pool and the loser's three-card offer
//! - `collision`: Rectangle overlap and push-out resolution
//! - `map`: Arena layouts and spawn points
//! - `input`: Input frames and per-player commands
//! - `state`: Bodies, bullets, particles and round state
//! - `physics`: Per-player integration and cooldowns
//! - `weapon`: Aiming and firing
//! - `projectile`: Bullet flight, bounces, hits and explosions
//! - `particle`: Cosmetic particle bursts
//! - `events`: Game events for replay/verification
//! - `round`: Round and match lifecycle
//! - `tick`: Authoritative simulation loop

pub mod stats;
pub mod cards;
pub mod collision;
pub mod map;
pub mod input;
pub mod state;
pub mod physics;
pub mod weapon;
pub mod projectile;
pub mod particle;
pub mod events;
pub mod round;
pub mod tick;

// Re-export key types
pub use stats::{Card, PlayerStats, Rarity, StatModifiers, resolve_stats};
pub use cards::{CardDealer, CardSource};
pub use input::{InputFrame, InputSample, PlayerCommand, TickInputs, ControlScheme};
pub use state::{PhysicsBody, Projectile, Side, SimulationState};
pub use round::{RoundController, RoundPhase, RoundTransition, Session};
pub use tick::{MatchConfig, PhysicsConfig, TickResult};
pub use events::GameEvent;
