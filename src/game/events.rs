//! Game Events
//!
//! Events generated during a tick for logging, replay checks and tests.

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;
use crate::game::state::Side;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A player fired a bullet
    ShotFired {
        shooter: Side,
        projectile_id: u32,
        ammo_left: u32,
    },

    /// A bullet reflected off a platform
    ProjectileBounced {
        projectile_id: u32,
        bounces_left: i32,
    },

    /// A bullet struck its target
    PlayerHit {
        victim: Side,
        projectile_id: u32,
        damage: f32,
        health_after: f32,
    },

    /// Life steal healed the shooter
    LifeStolen {
        side: Side,
        amount: f32,
    },

    /// An explosive bullet detonated
    Explosion {
        owner: Side,
        position: Vec2,
        radius: f32,
    },

    /// A player was caught in an explosion
    ExplosionDamage {
        victim: Side,
        damage: f32,
    },

    /// A player left the ground
    Jumped {
        side: Side,
    },

    /// A player started reloading
    ReloadStarted {
        side: Side,
    },

    /// A player fell out of the arena
    PlayerFell {
        side: Side,
    },

    /// A player's health reached zero and the round was decided
    PlayerDied {
        side: Side,
    },
}

/// A game event stamped with its tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Player involved, if any
    pub side: Option<Side>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, data: GameEventData) -> Self {
        let side = match &data {
            GameEventData::ShotFired { shooter, .. } => Some(*shooter),
            GameEventData::PlayerHit { victim, .. } => Some(*victim),
            GameEventData::LifeStolen { side, .. } => Some(*side),
            GameEventData::Explosion { owner, .. } => Some(*owner),
            GameEventData::ExplosionDamage { victim, .. } => Some(*victim),
            GameEventData::Jumped { side } => Some(*side),
            GameEventData::ReloadStarted { side } => Some(*side),
            GameEventData::PlayerFell { side } => Some(*side),
            GameEventData::PlayerDied { side } => Some(*side),
            GameEventData::ProjectileBounced { .. } => None,
        };

        Self { tick, side, data }
    }

    /// Create shot fired event.
    pub fn shot_fired(tick: u32, shooter: Side, projectile_id: u32, ammo_left: u32) -> Self {
        Self::new(
            tick,
            GameEventData::ShotFired {
                shooter,
                projectile_id,
                ammo_left,
            },
        )
    }

    /// Create projectile bounced event.
    pub fn projectile_bounced(tick: u32, projectile_id: u32, bounces_left: i32) -> Self {
        Self::new(
            tick,
            GameEventData::ProjectileBounced {
                projectile_id,
                bounces_left,
            },
        )
    }

    /// Create player hit event.
    pub fn player_hit(tick: u32, victim: Side, projectile_id: u32, damage: f32, health_after: f32) -> Self {
        Self::new(
            tick,
            GameEventData::PlayerHit {
                victim,
                projectile_id,
                damage,
                health_after,
            },
        )
    }

    /// Create life stolen event.
    pub fn life_stolen(tick: u32, side: Side, amount: f32) -> Self {
        Self::new(tick, GameEventData::LifeStolen { side, amount })
    }

    /// Create explosion event.
    pub fn explosion(tick: u32, owner: Side, position: Vec2, radius: f32) -> Self {
        Self::new(
            tick,
            GameEventData::Explosion {
                owner,
                position,
                radius,
            },
        )
    }

    /// Create explosion damage event.
    pub fn explosion_damage(tick: u32, victim: Side, damage: f32) -> Self {
        Self::new(tick, GameEventData::ExplosionDamage { victim, damage })
    }

    /// Create jumped event.
    pub fn jumped(tick: u32, side: Side) -> Self {
        Self::new(tick, GameEventData::Jumped { side })
    }

    /// Create reload started event.
    pub fn reload_started(tick: u32, side: Side) -> Self {
        Self::new(tick, GameEventData::ReloadStarted { side })
    }

    /// Create player fell event.
    pub fn player_fell(tick: u32, side: Side) -> Self {
        Self::new(tick, GameEventData::PlayerFell { side })
    }

    /// Create player died event.
    pub fn player_died(tick: u32, side: Side) -> Self {
        Self::new(tick, GameEventData::PlayerDied { side })
    }
}
