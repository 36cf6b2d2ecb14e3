//! Weapon System
//!
//! Aiming and firing. A shot that is blocked by cooldown, an empty magazine
//! or a reload is silently ignored.

use crate::core::vec2::{lerp_angle, Vec2};
use crate::game::events::GameEvent;
use crate::game::state::{PhysicsBody, Projectile, Side, SimulationState};
use crate::game::tick::PhysicsConfig;

/// Aim from the body center at a pointer position.
pub fn aim_at_pointer(body: &mut PhysicsBody, pointer: Vec2) {
    let angle = body.center().angle_to(pointer);
    body.set_aim(angle);
}

/// Ease the aim toward `target` along the short arc by `rate`.
pub fn assist_aim(body: &mut PhysicsBody, target: Vec2, rate: f32) {
    let ideal = body.center().angle_to(target);
    let angle = lerp_angle(body.aim_angle, ideal, rate);
    body.set_aim(angle);
}

/// Whether the body may fire this tick.
#[inline]
pub fn can_fire(body: &PhysicsBody) -> bool {
    body.shoot_cooldown <= 0.0 && body.ammo > 0 && !body.is_reloading()
}

/// Build the bullet a body fires along its current aim.
///
/// Spawns one body-extent out from the center so it starts clear of the
/// shooter.
pub fn spawn_projectile(body: &PhysicsBody, id: u32, config: &PhysicsConfig) -> Projectile {
    let dir = Vec2::from_angle(body.aim_angle);
    let center = body.center();
    let stats = &body.stats;

    Projectile {
        id,
        owner: body.side,
        target: body.side.opponent(),
        position: Vec2::new(center.x + dir.x * body.width, center.y + dir.y * body.height),
        velocity: dir.scale(stats.bullet_speed),
        size: stats.bullet_size,
        damage: stats.damage,
        bounces_left: stats.bullet_bounces as i32,
        lifetime: config.bullet_lifetime,
        explosive: stats.explosive_radius > 0.0,
        explosive_radius: stats.explosive_radius,
        knockback: stats.knockback,
        homing: stats.homing,
    }
}

/// Try to fire for `side`. Returns the new projectile id if a shot was fired.
pub fn attempt_shoot(state: &mut SimulationState, side: Side, config: &PhysicsConfig) -> Option<u32> {
    if !can_fire(state.body(side)) {
        return None;
    }

    let id = state.next_projectile_id();
    let body = state.body_mut(side);

    body.ammo -= 1;
    body.shoot_cooldown = body.stats.fire_rate;

    // Recoil pushes opposite the aim
    let recoil = Vec2::from_angle(body.aim_angle).scale(config.recoil);
    body.velocity = body.velocity - recoil;

    let projectile = spawn_projectile(body, id, config);
    let ammo_left = body.ammo;

    state.projectiles.push(projectile);
    state.add_shake(config.shake_per_shot);

    let tick = state.tick;
    state.push_event(GameEvent::shot_fired(tick, side, id, ammo_left));

    Some(id)
}
