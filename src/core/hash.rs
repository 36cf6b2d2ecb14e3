//! Simulation state digests.
//!
//! Two runs that start from the same state and see the same inputs must
//! end with the same digest. The replay check in the binary and the
//! determinism tests compare these.

use sha2::{Digest, Sha256};

use super::vec2::Vec2;

/// SHA-256 digest of a simulation state.
pub type StateHash = [u8; 32];

const STATE_DOMAIN: &[u8] = b"NEON_ROUNDS_STATE_V1";

/// Feeds simulation fields into SHA-256.
///
/// Integers go in little-endian and floats by bit pattern, so `-0.0` and
/// `0.0` hash differently. Field order is part of the digest.
pub struct StateHasher {
    inner: Sha256,
}

impl StateHasher {
    fn with_domain(domain: &[u8]) -> Self {
        Self {
            inner: Sha256::new_with_prefix(domain),
        }
    }

    /// Append a byte.
    #[inline]
    pub fn write_u8(&mut self, v: u8) {
        self.inner.update([v]);
    }

    /// Append a `u32`.
    #[inline]
    pub fn write_u32(&mut self, v: u32) {
        self.inner.update(v.to_le_bytes());
    }

    /// Append a `u64`.
    #[inline]
    pub fn write_u64(&mut self, v: u64) {
        self.inner.update(v.to_le_bytes());
    }

    /// Append an `i32`.
    #[inline]
    pub fn write_i32(&mut self, v: i32) {
        self.inner.update(v.to_le_bytes());
    }

    /// Append an `f32` by bits.
    #[inline]
    pub fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    /// Append both components.
    #[inline]
    pub fn write_vec2(&mut self, v: Vec2) {
        self.write_f32(v.x);
        self.write_f32(v.y);
    }

    /// Append a flag as one byte.
    #[inline]
    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    /// Consume the hasher.
    pub fn finish(self) -> StateHash {
        self.inner.finalize().into()
    }
}

/// Digest of one simulation frame.
///
/// `tick` and `rng_seed` lead; `fields` appends the rest in a fixed order.
pub fn compute_state_hash(tick: u32, rng_seed: u64, fields: impl FnOnce(&mut StateHasher)) -> StateHash {
    let mut h = StateHasher::with_domain(STATE_DOMAIN);
    h.write_u32(tick);
    h.write_u64(rng_seed);
    fields(&mut h);
    h.finish()
}
