//! Projectile System
//!
//! Per bullet, per tick: steer (homing), move, age, bounce off the first
//! platform hit, then test the target body. A bullet hits at most one
//! player and is removed on that hit, on expiry, or when a wall contact
//! leaves it with a negative bounce count.

use crate::core::vec2::{shortest_angle, Vec2};
use crate::game::collision::{bounce_off, intersects};
use crate::game::events::GameEvent;
use crate::game::particle::{spawn_burst, EXPLOSION_PARTICLES, FIZZLE_PARTICLES, IMPACT_PARTICLES};
use crate::game::state::{ParticleKind, Projectile, Side, SimulationState};
use crate::game::tick::PhysicsConfig;

/// Rotate the bullet's heading toward `target` by its homing fraction.
///
/// Speed is preserved.
pub fn steer_towards(projectile: &mut Projectile, target: Vec2) {
    let heading = projectile.velocity.angle();
    let desired = projectile.center().angle_to(target);
    let new_heading = heading + shortest_angle(heading, desired) * projectile.homing;
    let speed = projectile.velocity.length();
    projectile.velocity = Vec2::from_angle(new_heading).scale(speed);
}

/// Advance every live projectile by one tick.
pub fn update_projectiles(state: &mut SimulationState, config: &PhysicsConfig) {
    let live = std::mem::take(&mut state.projectiles);
    let mut survivors = Vec::with_capacity(live.len());

    for mut bullet in live {
        if bullet.homing > 0.0 {
            let target = state.body(bullet.target).center();
            steer_towards(&mut bullet, target);
        }

        bullet.position = bullet.position + bullet.velocity;
        bullet.lifetime -= 1;

        let mut rect = bullet.rect();
        let hit_wall = bounce_off(&mut rect, &mut bullet.velocity.x, &mut bullet.velocity.y, &state.platforms);
        if hit_wall {
            bullet.position = Vec2::new(rect.x, rect.y);
            bullet.bounces_left -= 1;
            let tick = state.tick;
            state.push_event(GameEvent::projectile_bounced(tick, bullet.id, bullet.bounces_left));
        }

        if intersects(&bullet.rect(), &state.body(bullet.target).rect()) {
            hit_target(state, &bullet, config);
            continue;
        }

        if bullet.lifetime <= 0 || (hit_wall && bullet.bounces_left < 0) {
            if bullet.explosive && hit_wall {
                explode(state, &bullet, config);
            }
            spawn_burst(
                &mut state.particles,
                &mut state.rng,
                bullet.position,
                ParticleKind::Fizzle(bullet.owner),
                FIZZLE_PARTICLES,
            );
            continue;
        }

        survivors.push(bullet);
    }

    state.projectiles = survivors;
}

fn hit_target(state: &mut SimulationState, bullet: &Projectile, config: &PhysicsConfig) {
    let tick = state.tick;

    let victim = state.body_mut(bullet.target);
    let health_after = victim.take_damage(bullet.damage);

    // Knockback follows the bullet's direction of travel
    let push_x = if bullet.velocity.x > 0.0 { 1.0 } else { -1.0 };
    let push_y = if bullet.velocity.y > 0.0 { 1.0 } else { -1.0 };
    victim.velocity.x += push_x * bullet.knockback;
    victim.velocity.y += push_y * bullet.knockback * 0.5;

    state.add_shake(config.shake_per_hit);
    state.push_event(GameEvent::player_hit(tick, bullet.target, bullet.id, bullet.damage, health_after));

    let attacker = state.body_mut(bullet.owner);
    let life_steal = attacker.stats.life_steal;
    if life_steal > 0.0 {
        let healed = attacker.heal(bullet.damage * life_steal);
        state.push_event(GameEvent::life_stolen(tick, bullet.owner, healed));
    }

    if bullet.explosive {
        explode(state, bullet, config);
    }

    spawn_burst(
        &mut state.particles,
        &mut state.rng,
        bullet.position,
        ParticleKind::Impact(bullet.owner),
        IMPACT_PARTICLES,
    );
}

/// Detonate at the bullet's position.
///
/// Every player whose center is within `radius + max(width, height)` takes
/// a share of the bullet's damage, the shooter included.
pub fn explode(state: &mut SimulationState, bullet: &Projectile, config: &PhysicsConfig) {
    let tick = state.tick;
    let origin = bullet.position;
    let damage = bullet.damage * config.explosion_damage_factor;

    for side in Side::ALL {
        let body = state.body_mut(side);
        let reach = bullet.explosive_radius + body.width.max(body.height);
        if body.center().distance(origin) < reach {
            body.take_damage(damage);
            state.push_event(GameEvent::explosion_damage(tick, side, damage));
        }
    }

    spawn_burst(
        &mut state.particles,
        &mut state.rng,
        origin,
        ParticleKind::Explosion,
        EXPLOSION_PARTICLES,
    );
    state.add_shake(config.shake_per_explosion);
    state.push_event(GameEvent::explosion(tick, bullet.owner, origin, bullet.explosive_radius));
}
