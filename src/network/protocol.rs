//! Protocol Messages
//!
//! Wire format between the two peers of a match. Messages are JSON objects
//! of the form `{"type": "STATE", "payload": {...}}`; the per-tick state
//! snapshot also has a compact bincode encoding.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::vec2::Vec2;
use crate::game::input::InputFrame;
use crate::game::round::Session;
use crate::game::state::{PhysicsBody, Projectile, Side, SimulationState};
use crate::game::stats::Card;

/// Encode/decode failures.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON encode or decode failed.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary encode or decode failed.
    #[error("binary codec error: {0}")]
    Binary(#[from] bincode::Error),
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Every message exchanged between host and client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetMessage {
    /// Client -> host, every tick.
    Input(InputPayload),

    /// Host -> client, every tick. Full overwrite, not a delta.
    State(StateSnapshot),

    /// Host -> client on match/round start and after a card pick.
    SessionUpdate(Session),

    /// Host -> client once per round.
    RoundEnd {
        /// Round winner
        winner: Side,
    },

    /// Host -> client: the cards offered to the loser.
    CardsGenerated(Vec<Card>),

    /// Client -> host: the card the client picked as loser.
    CardSelect(Card),
}

impl NetMessage {
    /// Wire name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            NetMessage::Input(_) => "INPUT",
            NetMessage::State(_) => "STATE",
            NetMessage::SessionUpdate(_) => "SESSION_UPDATE",
            NetMessage::RoundEnd { .. } => "ROUND_END",
            NetMessage::CardsGenerated(_) => "CARDS_GENERATED",
            NetMessage::CardSelect(_) => "CARD_SELECT",
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(s)?)
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Raw controls of the client for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputPayload {
    /// Up held
    pub up: bool,
    /// Left held
    pub left: bool,
    /// Down held
    pub down: bool,
    /// Right held
    pub right: bool,
    /// Jump held
    pub jump: bool,
    /// Shoot held
    pub shoot: bool,
    /// Pointer x in arena coordinates
    pub pointer_x: f32,
    /// Pointer y in arena coordinates
    pub pointer_y: f32,
}

impl InputPayload {
    /// Convert to an InputFrame for the simulation.
    pub fn to_input_frame(&self) -> InputFrame {
        let mut frame = InputFrame::new().with_pointer(self.pointer_x, self.pointer_y);
        frame.set(InputFrame::FLAG_UP, self.up);
        frame.set(InputFrame::FLAG_LEFT, self.left);
        frame.set(InputFrame::FLAG_DOWN, self.down);
        frame.set(InputFrame::FLAG_RIGHT, self.right);
        frame.set(InputFrame::FLAG_JUMP, self.jump);
        frame.set(InputFrame::FLAG_SHOOT, self.shoot);
        frame
    }
}

impl From<&InputFrame> for InputPayload {
    fn from(frame: &InputFrame) -> Self {
        Self {
            up: frame.up(),
            left: frame.left(),
            down: frame.down(),
            right: frame.right(),
            jump: frame.jump(),
            shoot: frame.shoot(),
            pointer_x: frame.pointer.x,
            pointer_y: frame.pointer.y,
        }
    }
}

/// Replicated subset of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodySnapshot {
    /// Position x
    pub x: f32,
    /// Position y
    pub y: f32,
    /// Velocity x
    pub vx: f32,
    /// Velocity y
    pub vy: f32,
    /// Health
    pub health: f32,
    /// Facing (+1 right, -1 left)
    pub facing: i8,
    /// Aim angle in radians
    pub aim_angle: f32,
    /// Rounds in the magazine
    pub ammo: u32,
    /// Walk-cycle phase
    pub walk_phase: f32,
}

impl BodySnapshot {
    /// Capture a body.
    pub fn capture(body: &PhysicsBody) -> Self {
        Self {
            x: body.position.x,
            y: body.position.y,
            vx: body.velocity.x,
            vy: body.velocity.y,
            health: body.health,
            facing: body.facing,
            aim_angle: body.aim_angle,
            ammo: body.ammo,
            walk_phase: body.walk_phase,
        }
    }

    /// Overwrite the replicated fields of a body.
    pub fn apply(&self, body: &mut PhysicsBody) {
        body.position = Vec2::new(self.x, self.y);
        body.velocity = Vec2::new(self.vx, self.vy);
        body.health = self.health;
        body.facing = self.facing;
        body.aim_angle = self.aim_angle;
        body.ammo = self.ammo;
        body.walk_phase = self.walk_phase;
    }
}

/// Full per-tick state sent by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Host tick the snapshot was taken at
    pub tick: u32,
    /// Player 1
    pub p1: BodySnapshot,
    /// Player 2
    pub p2: BodySnapshot,
    /// Every live bullet
    pub bullets: Vec<Projectile>,
    /// Round already decided
    pub round_ended: bool,
    /// Camera shake magnitude
    pub screen_shake: f32,
}

impl StateSnapshot {
    /// Capture the replicated part of a simulation.
    pub fn capture(state: &SimulationState) -> Self {
        Self {
            tick: state.tick,
            p1: BodySnapshot::capture(&state.p1),
            p2: BodySnapshot::capture(&state.p2),
            bullets: state.projectiles.clone(),
            round_ended: state.round_ended,
            screen_shake: state.screen_shake,
        }
    }

    /// Serialize to binary (bincode).
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from binary (bincode).
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        Ok(bincode::deserialize(data)?)
    }
}
