//! # Neon Rounds
//!
//! Deterministic simulation and host-authoritative sync for a two-player
//! arena shooter. Players lose rounds, pick upgrade cards, and the first to
//! the target win count takes the match.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        NEON ROUNDS                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec2.rs     - 2D vector and angle helpers               │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── stats.rs    - Stat resolution from cards                │
//! │  ├── cards.rs    - Card pool and offers                      │
//! │  ├── collision.rs- Rectangle collision                       │
//! │  ├── physics.rs  - Player integration                        │
//! │  ├── weapon.rs   - Aiming and firing                         │
//! │  ├── projectile.rs - Bullets, bounces, explosions            │
//! │  ├── round.rs    - Round and match lifecycle                 │
//! │  └── tick.rs     - Authoritative simulation loop             │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── protocol.rs - Message types                             │
//! │  ├── transport.rs- Channel and WebSocket transports          │
//! │  ├── sync.rs     - Snapshot broadcast and mirroring          │
//! │  ├── session.rs  - Match session (local / host / client)     │
//! │  └── driver.rs   - Async frame loop                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given identical inputs, stats and seed, `game::tick::tick` produces
//! identical state on the same build:
//! - Fixed phase order per tick (p1 before p2, bullets, cosmetics, win check)
//! - No HashMap iteration in game logic
//! - No system time dependencies
//! - All randomness from the seeded Xorshift128+ stream
//!
//! Only the authoritative peer simulates; the other peer overwrites its
//! mirror from snapshots, so cross-platform float drift never matters.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::rng::DeterministicRng;
pub use game::input::{InputFrame, InputSample};
pub use game::state::{Side, SimulationState};
pub use game::tick::{MatchConfig, PhysicsConfig};
pub use network::session::{MatchSession, NetMode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Round wins needed to take a match
pub const TARGET_WINS: u32 = 5;
