//! Player Integration Step
//!
//! Per tick, per player: horizontal move and resolve, vertical move and
//! resolve, jump, fall-out check, then weapon cooldowns.

use crate::game::collision::{resolve_horizontal, resolve_vertical};
use crate::game::input::PlayerCommand;
use crate::game::map::Platform;
use crate::game::state::PhysicsBody;
use crate::game::tick::PhysicsConfig;

/// What happened to a body during one integration step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Left the ground this tick
    pub jumped: bool,
    /// Dropped below the arena this tick
    pub fell: bool,
    /// Started a reload this tick
    pub reload_started: bool,
}

/// Advance one body by one tick.
pub fn integrate(
    body: &mut PhysicsBody,
    cmd: &PlayerCommand,
    platforms: &[Platform],
    config: &PhysicsConfig,
) -> StepOutcome {
    let mut outcome = StepOutcome::default();

    // Horizontal: opposing inputs cancel additively
    if cmd.left {
        body.velocity.x -= body.stats.move_speed;
        body.walk_phase += config.walk_cycle_step;
    }
    if cmd.right {
        body.velocity.x += body.stats.move_speed;
        body.walk_phase += config.walk_cycle_step;
    }
    if !cmd.left && !cmd.right {
        body.walk_phase = 0.0;
    }

    body.velocity.x *= config.friction;
    body.position.x += body.velocity.x;

    let mut rect = body.rect();
    resolve_horizontal(&mut rect, &mut body.velocity.x, platforms);
    body.position.x = rect.x;

    // Vertical
    body.velocity.y += config.gravity * body.stats.gravity;
    if body.velocity.y > config.terminal_velocity {
        body.velocity.y = config.terminal_velocity;
    }
    body.velocity.y *= config.air_resistance;
    body.position.y += body.velocity.y;

    let mut rect = body.rect();
    body.on_ground = resolve_vertical(&mut rect, &mut body.velocity.y, platforms);
    body.position.y = rect.y;
    if body.on_ground {
        body.can_jump = true;
    }

    // Jump: one per ground contact
    if cmd.jump && body.can_jump {
        body.velocity.y = -body.stats.jump_force;
        body.can_jump = false;
        outcome.jumped = true;
    }

    if body.position.y > config.arena_height + config.fall_margin && body.health > 0.0 {
        body.health = 0.0;
        outcome.fell = true;
    }

    outcome.reload_started = tick_cooldowns(body);
    outcome
}

/// Advance shoot and reload counters. Returns true if a reload started.
pub fn tick_cooldowns(body: &mut PhysicsBody) -> bool {
    let mut started = false;

    if body.shoot_cooldown > 0.0 {
        body.shoot_cooldown -= 1.0;
    }
    if body.reload_timer > 0 {
        body.reload_timer -= 1;
    }

    if body.ammo == 0 && body.reload_timer == 0 {
        body.reload_timer = body.stats.reload_time;
        started = true;
        if body.reload_timer <= 1 {
            body.ammo = body.stats.max_ammo;
        }
    }

    // Refill on the last reload tick
    if body.reload_timer == 1 {
        body.ammo = body.stats.max_ammo;
    }

    started
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::collision::Rect;
    use crate::game::state::Side;
    use crate::game::stats::PlayerStats;

    fn floor() -> Vec<Platform> {
        vec![Rect::new(0.0, 240.0, 1200.0, 40.0)]
    }

    fn resting_body() -> PhysicsBody {
        PhysicsBody::new(Side::P1, Vec2::new(100.0, 200.0), PlayerStats::default())
    }

    #[test]
    fn test_resting_body_stays_grounded() {
        let config = PhysicsConfig::default();
        let mut body = resting_body();

        integrate(&mut body, &PlayerCommand::default(), &floor(), &config);

        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(body.position.y, 200.0);
        assert!(body.on_ground);
        assert!(body.can_jump);
    }

    #[test]
    fn test_friction_applies_without_input() {
        let config = PhysicsConfig::default();
        let mut body = resting_body();
        body.velocity.x = 10.0;

        integrate(&mut body, &PlayerCommand::default(), &floor(), &config);
        assert!((body.velocity.x - 8.5).abs() < 1e-5);
        assert_eq!(body.walk_phase, 0.0);
    }

    #[test]
    fn test_opposing_inputs_cancel() {
        let config = PhysicsConfig::default();
        let mut body = resting_body();
        let cmd = PlayerCommand { left: true, right: true, ..Default::default() };

        integrate(&mut body, &cmd, &floor(), &config);
        assert_eq!(body.velocity.x, 0.0);
        assert!(body.walk_phase > 0.0);
    }

    #[test]
    fn test_single_jump_per_contact() {
        let config = PhysicsConfig::default();
        let mut body = resting_body();
        let jump = PlayerCommand { jump: true, ..Default::default() };

        let outcome = integrate(&mut body, &jump, &floor(), &config);
        assert!(outcome.jumped);
        assert_eq!(body.velocity.y, -14.0);
        assert!(!body.can_jump);

        // Still airborne: holding jump does nothing
        let outcome = integrate(&mut body, &jump, &floor(), &config);
        assert!(!outcome.jumped);
        assert!(body.velocity.y < 0.0);
    }

    #[test]
    fn test_fall_out_kills_once() {
        let config = PhysicsConfig::default();
        let mut body = resting_body();
        body.position.y = 905.0;

        let outcome = integrate(&mut body, &PlayerCommand::default(), &[], &config);
        assert!(outcome.fell);
        assert_eq!(body.health, 0.0);

        let outcome = integrate(&mut body, &PlayerCommand::default(), &[], &config);
        assert!(!outcome.fell);
    }

    #[test]
    fn test_terminal_velocity() {
        let config = PhysicsConfig::default();
        let mut body = resting_body();
        body.velocity.y = 40.0;

        integrate(&mut body, &PlayerCommand::default(), &[], &config);
        assert!(body.velocity.y <= config.terminal_velocity);
    }

    #[test]
    fn test_reload_cycle() {
        let mut body = resting_body();
        body.ammo = 0;

        assert!(tick_cooldowns(&mut body));
        assert_eq!(body.reload_timer, 120);
        assert_eq!(body.ammo, 0);

        for _ in 0..119 {
            assert!(!tick_cooldowns(&mut body));
        }
        assert_eq!(body.reload_timer, 1);
        assert_eq!(body.ammo, 5);

        tick_cooldowns(&mut body);
        assert!(!body.is_reloading());
    }
}
