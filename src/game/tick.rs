//! Authoritative Simulation Tick
//!
//! One call advances a round by one frame. Only the authoritative side
//! (host, or the single local instance) ever calls this.

use serde::{Serialize, Deserialize};
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::vec2::Vec2;
use crate::game::events::GameEvent;
use crate::game::input::{AimMode, TickInputs};
use crate::game::map::{ARENA_HEIGHT, ARENA_WIDTH};
use crate::game::particle::{spawn_burst, update_particles, DEATH_PARTICLES, DUST_PARTICLES};
use crate::game::physics::integrate;
use crate::game::projectile::update_projectiles;
use crate::game::state::{ParticleKind, Side, SimulationState};
use crate::game::stats::PlayerStats;
use crate::game::weapon::{aim_at_pointer, assist_aim, attempt_shoot};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Set on the single tick that decided the round
    pub round_winner: Option<Side>,
}

/// Fixed physics and combat constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration per tick (scaled by the gravity stat)
    pub gravity: f32,
    /// Horizontal velocity decay per tick
    pub friction: f32,
    /// Vertical velocity decay per tick
    pub air_resistance: f32,
    /// Maximum fall speed
    pub terminal_velocity: f32,
    /// Arena width
    pub arena_width: f32,
    /// Arena height
    pub arena_height: f32,
    /// Distance below the arena that counts as falling out
    pub fall_margin: f32,
    /// Recoil impulse per shot
    pub recoil: f32,
    /// Bullet lifetime in ticks
    pub bullet_lifetime: i32,
    /// Share of bullet damage dealt by its explosion
    pub explosion_damage_factor: f32,
    /// Assisted-aim easing rate
    pub assist_aim_rate: f32,
    /// Walk-cycle advance per held direction
    pub walk_cycle_step: f32,
    /// Shake added per shot
    pub shake_per_shot: f32,
    /// Shake added per bullet hit
    pub shake_per_hit: f32,
    /// Shake added per explosion
    pub shake_per_explosion: f32,
    /// Shake decay factor per tick
    pub shake_decay: f32,
    /// Shake below this snaps to zero
    pub shake_floor: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.6,
            friction: 0.85,
            air_resistance: 0.98,
            terminal_velocity: 15.0,
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            fall_margin: 100.0,
            recoil: 2.0,
            bullet_lifetime: 200,
            explosion_damage_factor: 0.8,
            assist_aim_rate: 0.15,
            walk_cycle_step: 0.2,
            shake_per_shot: 2.0,
            shake_per_hit: 5.0,
            shake_per_explosion: 10.0,
            shake_decay: 0.9,
            shake_floor: 0.5,
        }
    }
}

/// Configuration for a whole match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Physics constants
    pub physics: PhysicsConfig,
    /// Round wins needed to take the match
    pub target_wins: u32,
    /// Frames between a round being decided and the next state being exposed
    pub round_end_grace_frames: u64,
    /// Stats before cards
    pub base_stats: PlayerStats,
    /// Seed for particles and card draws
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            target_wins: crate::TARGET_WINS,
            round_end_grace_frames: 2 * crate::TICK_RATE as u64,
            base_stats: PlayerStats::default(),
            seed: 0x4E45_4F4E,
        }
    }
}

/// Run one simulation tick.
///
/// Order: per player (p1 then p2) aim, integrate, shoot; then bullets,
/// particles, shake decay and finally the win check. Once the round has
/// been decided only cosmetics keep animating.
pub fn tick(state: &mut SimulationState, inputs: &TickInputs, config: &PhysicsConfig) -> TickResult {
    let mut result = TickResult::default();

    if state.round_ended {
        update_cosmetics(state, config);
        result.events = state.take_events();
        return result;
    }

    // 0. Advance tick counter
    state.tick += 1;

    // 1. Players, in fixed order
    for side in Side::ALL {
        let cmd = match side {
            Side::P1 => &inputs.p1,
            Side::P2 => &inputs.p2,
        };
        step_player(state, side, cmd, config);
    }

    // 2. Bullets
    update_projectiles(state, config);

    // 3. Particles and shake
    update_cosmetics(state, config);

    // 4. Win condition
    result.round_winner = check_round_end(state);

    #[cfg(feature = "debug-tracing")]
    trace!(tick = state.tick, hash = %hex::encode(state.compute_hash()), "tick");

    result.events = state.take_events();
    result
}

fn step_player(state: &mut SimulationState, side: Side, cmd: &crate::game::input::PlayerCommand, config: &PhysicsConfig) {
    let tick = state.tick;
    let opponent_center = state.body(side.opponent()).center();

    let (body, platforms) = match side {
        Side::P1 => (&mut state.p1, &state.platforms),
        Side::P2 => (&mut state.p2, &state.platforms),
    };

    match cmd.aim {
        AimMode::Pointer(pointer) => aim_at_pointer(body, pointer),
        AimMode::Assisted => assist_aim(body, opponent_center, config.assist_aim_rate),
    }

    let outcome = integrate(body, cmd, platforms, config);
    let feet = Vec2::new(body.position.x + body.width / 2.0, body.position.y + body.height);

    if outcome.jumped {
        spawn_burst(&mut state.particles, &mut state.rng, feet, ParticleKind::Dust, DUST_PARTICLES);
        state.push_event(GameEvent::jumped(tick, side));
    }
    if outcome.fell {
        state.push_event(GameEvent::player_fell(tick, side));
    }
    if outcome.reload_started {
        state.push_event(GameEvent::reload_started(tick, side));
    }

    if cmd.shoot {
        attempt_shoot(state, side, config);
    }
}

fn update_cosmetics(state: &mut SimulationState, config: &PhysicsConfig) {
    update_particles(&mut state.particles);

    if state.screen_shake > 0.0 {
        state.screen_shake *= config.shake_decay;
    }
    if state.screen_shake < config.shake_floor {
        state.screen_shake = 0.0;
    }
}

/// Latch the round on the first dead player. p1 is checked first, so a
/// simultaneous double death goes to p2.
fn check_round_end(state: &mut SimulationState) -> Option<Side> {
    if state.round_ended {
        return None;
    }

    let dead = Side::ALL.into_iter().find(|side| state.body(*side).is_dead())?;
    state.round_ended = true;

    let at = state.body(dead).position;
    spawn_burst(&mut state.particles, &mut state.rng, at, ParticleKind::Death(dead), DEATH_PARTICLES);

    let tick = state.tick;
    state.push_event(GameEvent::player_died(tick, dead));

    Some(dead.opponent())
}

/// Replay a round from recorded inputs.
///
/// Stops early once the round is decided. Returns the final state, the
/// round winner if any, and all events.
pub fn replay_round(
    initial_state: SimulationState,
    inputs: &[TickInputs],
    config: &PhysicsConfig,
) -> (SimulationState, Option<Side>, Vec<GameEvent>) {
    let mut state = initial_state;
    let mut all_events = Vec::new();
    let mut winner = None;

    for frame in inputs {
        let result = tick(&mut state, frame, config);
        all_events.extend(result.events);

        if result.round_winner.is_some() {
            winner = result.round_winner;
            break;
        }
    }

    (state, winner, all_events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collision::Rect;
    use crate::game::events::GameEventData;
    use crate::game::input::PlayerCommand;

    fn state() -> SimulationState {
        SimulationState::new_round(1, PlayerStats::default(), PlayerStats::default(), 12345)
    }

    fn scripted(t: usize) -> TickInputs {
        TickInputs {
            p1: PlayerCommand {
                right: t % 40 < 20,
                jump: t % 50 == 0,
                shoot: t % 7 == 0,
                aim: AimMode::Pointer(Vec2::new(900.0, 300.0)),
                ..Default::default()
            },
            p2: PlayerCommand {
                left: t % 30 < 10,
                jump: t % 45 == 0,
                shoot: t % 5 == 0,
                aim: AimMode::Assisted,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_tick_determinism() {
        let config = PhysicsConfig::default();
        let mut state1 = state();
        let mut state2 = state();

        for t in 0..300 {
            let inputs = scripted(t);
            tick(&mut state1, &inputs, &config);
            tick(&mut state2, &inputs, &config);
        }

        assert_eq!(state1.tick, state2.tick);
        assert_eq!(state1.compute_hash(), state2.compute_hash());
        assert_eq!(state1.particles, state2.particles);
    }

    #[test]
    fn test_player_movement() {
        let config = PhysicsConfig::default();
        let mut s = state();
        let start = s.p1.position.x;

        let inputs = TickInputs {
            p1: PlayerCommand { right: true, ..Default::default() },
            ..Default::default()
        };
        tick(&mut s, &inputs, &config);

        assert!(s.p1.position.x > start, "Player should move right");
        assert_eq!(s.tick, 1);
    }

    #[test]
    fn test_round_ends_once_and_freezes_gameplay() {
        let config = PhysicsConfig::default();
        let mut s = state();
        s.p2.health = 0.0;

        let result = tick(&mut s, &TickInputs::default(), &config);
        assert_eq!(result.round_winner, Some(Side::P1));
        assert!(s.round_ended);
        assert!(result.events.iter().any(|e| e.data == GameEventData::PlayerDied { side: Side::P2 }));

        let frozen_tick = s.tick;
        let frozen_pos = s.p1.position;
        let result = tick(&mut s, &TickInputs::default(), &config);
        assert_eq!(result.round_winner, None);
        assert_eq!(s.tick, frozen_tick);
        assert_eq!(s.p1.position, frozen_pos);
    }

    #[test]
    fn test_double_death_goes_to_p2() {
        let config = PhysicsConfig::default();
        let mut s = state();
        s.p1.health = 0.0;
        s.p2.health = 0.0;

        let result = tick(&mut s, &TickInputs::default(), &config);
        assert_eq!(result.round_winner, Some(Side::P2));
    }

    #[test]
    fn test_shake_decays_and_snaps() {
        let config = PhysicsConfig::default();
        let mut s = state();
        s.screen_shake = 1.0;

        tick(&mut s, &TickInputs::default(), &config);
        assert!((s.screen_shake - 0.9).abs() < 1e-6);

        s.screen_shake = 0.52;
        tick(&mut s, &TickInputs::default(), &config);
        assert_eq!(s.screen_shake, 0.0);
    }

    #[test]
    fn test_falling_out_decides_round() {
        let config = PhysicsConfig::default();
        let mut s = SimulationState::with_platforms(
            vec![Rect::new(0.0, 760.0, 200.0, 40.0)],
            1,
            PlayerStats::default(),
            PlayerStats::default(),
            1,
        );

        let mut winner = None;
        for _ in 0..200 {
            if let Some(w) = tick(&mut s, &TickInputs::default(), &config).round_winner {
                winner = Some(w);
                break;
            }
        }

        // p2 spawns over open air and drops out
        assert_eq!(winner, Some(Side::P1));
        assert_eq!(s.p2.health, 0.0);
    }

    #[test]
    fn test_config_partial_override() {
        let config: MatchConfig =
            serde_json::from_str(r#"{"target_wins": 3, "physics": {"gravity": 1.2}}"#).unwrap();

        assert_eq!(config.target_wins, 3);
        assert_eq!(config.round_end_grace_frames, 120);
        assert_eq!(config.physics.gravity, 1.2);
        assert_eq!(config.physics.friction, 0.85);
        assert_eq!(config.base_stats, PlayerStats::default());
    }

    #[test]
    fn test_replay_determinism() {
        let config = PhysicsConfig::default();
        let inputs: Vec<TickInputs> = (0..600).map(scripted).collect();

        let (final1, winner1, events1) = replay_round(state(), &inputs, &config);
        let (final2, winner2, events2) = replay_round(state(), &inputs, &config);

        assert_eq!(final1.compute_hash(), final2.compute_hash());
        assert_eq!(winner1, winner2);
        assert!(!events1.is_empty());
        assert_eq!(events1, events2);
    }
}
