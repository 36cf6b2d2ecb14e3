//! Input Capture and Normalization
//!
//! Device input is captured once per frame into an immutable [`InputSample`]
//! and mapped to per-player [`PlayerCommand`]s before the tick runs. The
//! tick never reads device state directly.

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Raw input state for a single frame.
///
/// The default value (no buttons, pointer at the origin) is also what the
/// host assumes for a remote player it has not heard from yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Button flags (packed bits):
    /// - Bit 0: Up
    /// - Bit 1: Left
    /// - Bit 2: Down
    /// - Bit 3: Right
    /// - Bit 4: Jump
    /// - Bit 5: Shoot
    /// - Bit 6-7: Reserved
    pub flags: u8,

    /// Pointer position in arena coordinates.
    pub pointer: Vec2,
}

impl InputFrame {
    /// Up flag bit
    pub const FLAG_UP: u8 = 0x01;
    /// Left flag bit
    pub const FLAG_LEFT: u8 = 0x02;
    /// Down flag bit
    pub const FLAG_DOWN: u8 = 0x04;
    /// Right flag bit
    pub const FLAG_RIGHT: u8 = 0x08;
    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x10;
    /// Shoot flag bit
    pub const FLAG_SHOOT: u8 = 0x20;

    /// Create an empty input frame.
    pub const fn new() -> Self {
        Self {
            flags: 0,
            pointer: Vec2::ZERO,
        }
    }

    /// Builder: set flag bits.
    pub const fn with_flags(mut self, flags: u8) -> Self {
        self.flags |= flags;
        self
    }

    /// Builder: set pointer position.
    pub const fn with_pointer(mut self, x: f32, y: f32) -> Self {
        self.pointer = Vec2::new(x, y);
        self
    }

    /// Set or clear a flag.
    #[inline]
    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    #[inline]
    fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Up held.
    #[inline]
    pub fn up(&self) -> bool {
        self.has(Self::FLAG_UP)
    }

    /// Left held.
    #[inline]
    pub fn left(&self) -> bool {
        self.has(Self::FLAG_LEFT)
    }

    /// Down held.
    #[inline]
    pub fn down(&self) -> bool {
        self.has(Self::FLAG_DOWN)
    }

    /// Right held.
    #[inline]
    pub fn right(&self) -> bool {
        self.has(Self::FLAG_RIGHT)
    }

    /// Jump held.
    #[inline]
    pub fn jump(&self) -> bool {
        self.has(Self::FLAG_JUMP)
    }

    /// Shoot held.
    #[inline]
    pub fn shoot(&self) -> bool {
        self.has(Self::FLAG_SHOOT)
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// How a player's aim angle is driven this tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum AimMode {
    /// Aim from body center at a pointer position.
    Pointer(Vec2),
    /// Ease toward the opponent's center (local second player).
    Assisted,
}

/// Per-player intent for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerCommand {
    /// Accelerate left
    pub left: bool,
    /// Accelerate right
    pub right: bool,
    /// Jump if grounded
    pub jump: bool,
    /// Down (reserved, carried for parity with the wire input)
    pub down: bool,
    /// Try to fire
    pub shoot: bool,
    /// Aim source
    pub aim: AimMode,
}

impl Default for PlayerCommand {
    fn default() -> Self {
        Self::from_pointer_frame(&InputFrame::default())
    }
}

impl PlayerCommand {
    /// Pointer-aimed command: mouse aim, dedicated jump button.
    pub fn from_pointer_frame(frame: &InputFrame) -> Self {
        Self {
            left: frame.left(),
            right: frame.right(),
            jump: frame.jump(),
            down: frame.down(),
            shoot: frame.shoot(),
            aim: AimMode::Pointer(frame.pointer),
        }
    }

    /// Second local keyboard player: `up` jumps, aim is assisted.
    pub fn from_companion_frame(frame: &InputFrame) -> Self {
        Self {
            left: frame.left(),
            right: frame.right(),
            jump: frame.up(),
            down: frame.down(),
            shoot: frame.shoot(),
            aim: AimMode::Assisted,
        }
    }
}

/// Commands for both players for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInputs {
    /// Player 1
    pub p1: PlayerCommand,
    /// Player 2
    pub p2: PlayerCommand,
}

/// Who drives player 2 on the authoritative side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlScheme {
    /// Both players share one device; p2 uses the companion keys.
    LocalTwoPlayer,
    /// p2 is a remote peer with its own pointer.
    Networked,
}

/// Immutable input snapshot taken at the start of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSample {
    /// This device's primary controls (always player 1 on the authoritative side).
    pub local: InputFrame,
    /// Player 2: second local keyboard, or the last input received from the remote peer.
    pub opponent: InputFrame,
}

impl InputSample {
    /// Create a sample.
    pub fn new(local: InputFrame, opponent: InputFrame) -> Self {
        Self { local, opponent }
    }

    /// Map the sample to per-player commands.
    pub fn commands(&self, scheme: ControlScheme) -> TickInputs {
        let p2 = match scheme {
            ControlScheme::LocalTwoPlayer => PlayerCommand::from_companion_frame(&self.opponent),
            ControlScheme::Networked => PlayerCommand::from_pointer_frame(&self.opponent),
        };

        TickInputs {
            p1: PlayerCommand::from_pointer_frame(&self.local),
            p2,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame_is_idle() {
        let frame = InputFrame::default();
        assert!(!frame.up() && !frame.left() && !frame.down());
        assert!(!frame.right() && !frame.jump() && !frame.shoot());
        assert_eq!(frame.pointer, Vec2::ZERO);
    }

    #[test]
    fn test_flag_set_and_clear() {
        let mut frame = InputFrame::new().with_flags(InputFrame::FLAG_LEFT | InputFrame::FLAG_SHOOT);
        assert!(frame.left());
        assert!(frame.shoot());

        frame.set(InputFrame::FLAG_LEFT, false);
        frame.set(InputFrame::FLAG_JUMP, true);
        assert!(!frame.left());
        assert!(frame.jump());
    }

    #[test]
    fn test_companion_jumps_with_up() {
        let companion = InputFrame::new().with_flags(InputFrame::FLAG_UP);
        let sample = InputSample::new(InputFrame::default(), companion);

        let local = sample.commands(ControlScheme::LocalTwoPlayer);
        assert!(local.p2.jump);
        assert_eq!(local.p2.aim, AimMode::Assisted);

        // A remote peer's up key is not a jump
        let networked = sample.commands(ControlScheme::Networked);
        assert!(!networked.p2.jump);
        assert_eq!(networked.p2.aim, AimMode::Pointer(Vec2::ZERO));
    }

    #[test]
    fn test_local_player_uses_pointer() {
        let local = InputFrame::new()
            .with_flags(InputFrame::FLAG_JUMP | InputFrame::FLAG_RIGHT)
            .with_pointer(640.0, 300.0);
        let cmds = InputSample::new(local, InputFrame::default()).commands(ControlScheme::Networked);

        assert!(cmds.p1.jump);
        assert!(cmds.p1.right);
        assert_eq!(cmds.p1.aim, AimMode::Pointer(Vec2::new(640.0, 300.0)));
    }
}
