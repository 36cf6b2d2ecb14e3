//! Core deterministic primitives.
//!
//! Nothing in this module knows about the game. Everything here is a pure
//! function of its inputs so host and replay runs stay in lockstep.

pub mod vec2;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash};
