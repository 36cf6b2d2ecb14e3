//! Cosmetic Particles
//!
//! Bursts are scattered with the round RNG so a replay reproduces them.

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::state::{Particle, ParticleKind};

/// Particles per bullet impact on a player.
pub const IMPACT_PARTICLES: usize = 10;
/// Particles when a bullet expires or breaks on a wall.
pub const FIZZLE_PARTICLES: usize = 5;
/// Particles per explosion.
pub const EXPLOSION_PARTICLES: usize = 20;
/// Particles per jump.
pub const DUST_PARTICLES: usize = 3;
/// Particles when a player dies.
pub const DEATH_PARTICLES: usize = 50;

const MAX_LIFE: f32 = 50.0;
const MIN_LIFE: f32 = 30.0;
const SCATTER: f32 = 5.0;

/// Push `count` particles of `kind` at `origin`.
pub fn spawn_burst(
    particles: &mut Vec<Particle>,
    rng: &mut DeterministicRng,
    origin: Vec2,
    kind: ParticleKind,
    count: usize,
) {
    particles.reserve(count);
    for _ in 0..count {
        let vx = rng.next_f32_range(-SCATTER, SCATTER);
        let vy = rng.next_f32_range(-SCATTER, SCATTER);
        let life = rng.next_f32_range(MIN_LIFE, MAX_LIFE);

        particles.push(Particle {
            position: origin,
            velocity: Vec2::new(vx, vy),
            life,
            max_life: MAX_LIFE,
            alpha: 1.0,
            kind,
        });
    }
}

/// Move, age and fade every particle, dropping expired ones.
pub fn update_particles(particles: &mut Vec<Particle>) {
    particles.retain_mut(|p| {
        p.position = p.position + p.velocity;
        p.life -= 1.0;
        p.alpha = p.life / p.max_life;
        p.life > 0.0
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_ranges() {
        let mut particles = Vec::new();
        let mut rng = DeterministicRng::new(1);
        spawn_burst(&mut particles, &mut rng, Vec2::new(10.0, 10.0), ParticleKind::Explosion, 200);

        assert_eq!(particles.len(), 200);
        for p in &particles {
            assert!(p.velocity.x >= -5.0 && p.velocity.x < 5.0);
            assert!(p.velocity.y >= -5.0 && p.velocity.y < 5.0);
            assert!(p.life >= 30.0 && p.life < 50.0);
            assert_eq!(p.alpha, 1.0);
        }
    }

    #[test]
    fn test_particles_fade_and_expire() {
        let mut particles = Vec::new();
        let mut rng = DeterministicRng::new(2);
        spawn_burst(&mut particles, &mut rng, Vec2::ZERO, ParticleKind::Dust, DUST_PARTICLES);

        update_particles(&mut particles);
        for p in &particles {
            assert!(p.alpha < 1.0);
            assert_eq!(p.alpha, p.life / p.max_life);
        }

        for _ in 0..50 {
            update_particles(&mut particles);
        }
        assert!(particles.is_empty());
    }
}
