//! Player Stats and Modifier Folding
//!
//! A player's stats for a round are derived from the base stats plus every
//! card that player has collected so far. Folding is pure: the same base
//! and the same card list give the same stats on both peers.

use serde::{Serialize, Deserialize};

/// Minimum frames between shots after folding.
pub const MIN_FIRE_RATE: f32 = 2.0;

/// Minimum horizontal acceleration after folding.
pub const MIN_MOVE_SPEED: f32 = 0.2;

/// Derived per-round player stats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    /// Horizontal acceleration per tick while a direction is held
    pub move_speed: f32,
    /// Upward velocity applied on jump
    pub jump_force: f32,
    /// Health at round start
    pub max_health: f32,
    /// Body width
    pub width: f32,
    /// Body height
    pub height: f32,
    /// Damage per bullet
    pub damage: f32,
    /// Ticks between shots
    pub fire_rate: f32,
    /// Bullet speed (pixels per tick)
    pub bullet_speed: f32,
    /// Bullet edge length
    pub bullet_size: f32,
    /// Magazine size
    pub max_ammo: u32,
    /// Ticks to refill an empty magazine
    pub reload_time: u32,
    /// Wall reflections before a bullet is removed
    pub bullet_bounces: u32,
    /// Fraction of damage dealt returned to the shooter as health
    pub life_steal: f32,
    /// Explosion radius (0 = not explosive)
    pub explosive_radius: f32,
    /// Knockback impulse applied to the victim
    pub knockback: f32,
    /// Gravity multiplier
    pub gravity: f32,
    /// Homing steering fraction per tick
    pub homing: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            move_speed: 1.2,
            jump_force: 14.0,
            max_health: 100.0,
            width: 40.0,
            height: 40.0,
            damage: 25.0,
            fire_rate: 20.0,
            bullet_speed: 12.0,
            bullet_size: 8.0,
            max_ammo: 5,
            reload_time: 120,
            bullet_bounces: 0,
            life_steal: 0.0,
            explosive_radius: 0.0,
            knockback: 5.0,
            gravity: 1.0,
            homing: 0.0,
        }
    }
}

/// Sparse stat deltas carried by a card.
///
/// `*_mult` keys multiply the running stat; `bullet_bounces`, `life_steal`,
/// `explosive_radius` and `homing` add to it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatModifiers {
    /// Move speed multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mult: Option<f32>,
    /// Jump force multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jump_mult: Option<f32>,
    /// Body size multiplier (both axes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_mult: Option<f32>,
    /// Max health multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_mult: Option<f32>,
    /// Damage multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_mult: Option<f32>,
    /// Fire interval multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_rate_mult: Option<f32>,
    /// Bullet speed multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_speed_mult: Option<f32>,
    /// Bullet size multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_size_mult: Option<f32>,
    /// Magazine multiplier (floored)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ammo_mult: Option<f32>,
    /// Extra wall bounces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_bounces: Option<f32>,
    /// Extra life steal fraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_steal: Option<f32>,
    /// Extra explosion radius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explosive_radius: Option<f32>,
    /// Knockback multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knockback_mult: Option<f32>,
    /// Gravity multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gravity_mult: Option<f32>,
    /// Extra homing strength
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homing: Option<f32>,
}

/// Card rarity tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    /// Common card
    Common,
    /// Rare card
    Rare,
    /// Legendary card
    Legendary,
}

/// An upgrade card. Immutable once drawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Instance id (unique per draw)
    pub id: String,
    /// Display name
    pub name: String,
    /// Display text
    pub description: String,
    /// Rarity tier
    pub rarity: Rarity,
    /// Stat deltas
    pub stats: StatModifiers,
}

/// Present and non-zero modifier value.
#[inline]
fn active(value: Option<f32>) -> Option<f32> {
    value.filter(|v| *v != 0.0)
}

/// Fold one card's modifiers onto `stats` in the fixed key order.
pub fn apply_modifiers(stats: &mut PlayerStats, m: &StatModifiers) {
    if let Some(v) = active(m.speed_mult) {
        stats.move_speed *= v;
    }
    if let Some(v) = active(m.jump_mult) {
        stats.jump_force *= v;
    }
    if let Some(v) = active(m.size_mult) {
        stats.width *= v;
        stats.height *= v;
    }
    if let Some(v) = active(m.health_mult) {
        stats.max_health *= v;
    }
    if let Some(v) = active(m.damage_mult) {
        stats.damage *= v;
    }
    if let Some(v) = active(m.fire_rate_mult) {
        stats.fire_rate *= v;
    }
    if let Some(v) = active(m.bullet_speed_mult) {
        stats.bullet_speed *= v;
    }
    if let Some(v) = active(m.bullet_size_mult) {
        stats.bullet_size *= v;
    }
    if let Some(v) = active(m.ammo_mult) {
        stats.max_ammo = (stats.max_ammo as f32 * v).floor().max(0.0) as u32;
    }
    if let Some(v) = active(m.bullet_bounces) {
        stats.bullet_bounces = (stats.bullet_bounces as f32 + v).floor().max(0.0) as u32;
    }
    if let Some(v) = active(m.life_steal) {
        stats.life_steal += v;
    }
    if let Some(v) = active(m.explosive_radius) {
        stats.explosive_radius += v;
    }
    if let Some(v) = active(m.knockback_mult) {
        stats.knockback *= v;
    }
    if let Some(v) = active(m.gravity_mult) {
        stats.gravity *= v;
    }
    if let Some(v) = active(m.homing) {
        stats.homing += v;
    }
}

/// Resolve final stats from base stats and an ordered card list.
pub fn resolve_stats(base: &PlayerStats, cards: &[Card]) -> PlayerStats {
    let mut stats = base.clone();
    for card in cards {
        apply_modifiers(&mut stats, &card.stats);
    }
    stats.fire_rate = stats.fire_rate.max(MIN_FIRE_RATE);
    stats.move_speed = stats.move_speed.max(MIN_MOVE_SPEED);
    stats
}
