//! Seeded randomness for particles and card draws.
//!
//! Xorshift128+ seeded through SplitMix64. Every draw advances the state in
//! the same way on every platform, so a round replayed from its seed makes
//! the same sparks and deals the same cards.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const SEED_DOMAIN: &[u8] = b"NEON_ROUNDS_SEED_V1";

/// Xorshift128+ generator.
///
/// ```
/// use neon_rounds::core::rng::DeterministicRng;
///
/// let mut host = DeterministicRng::new(7);
/// let mut replay = DeterministicRng::new(7);
/// assert_eq!(host.next_f32_range(-2.0, 2.0), replay.next_f32_range(-2.0, 2.0));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    s: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Seed a generator. Any seed works, including 0.
    pub fn new(seed: u64) -> Self {
        let mut cursor = seed;
        let a = splitmix64(&mut cursor);
        let b = splitmix64(&mut cursor);
        // All-zero state would emit zeros forever
        let s = if (a | b) == 0 { [1, 1] } else { [a, b] };
        Self { s }
    }

    /// Raw 64-bit draw.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let [x, mut y] = self.s;
        let out = x.wrapping_add(y);
        y ^= x;
        self.s = [x.rotate_left(24) ^ y ^ (y << 16), y.rotate_left(37)];
        out
    }

    /// Low 32 bits of a draw.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    /// Uniform integer in `[0, bound)`; 0 when `bound` is 0.
    #[inline]
    pub fn next_int(&mut self, bound: u32) -> u32 {
        match bound {
            0 => 0,
            n => (self.next_u64() % u64::from(n)) as u32,
        }
    }

    /// Uniform `f32` in `[0, 1)` built from the top 24 bits.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / 16_777_216.0
    }

    /// Uniform `f32` in `[lo, hi)`. An empty range yields `lo`.
    #[inline]
    pub fn next_f32_range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        lo + (hi - lo) * self.next_f32()
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_int(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }

    /// Internal state, folded into the state hash.
    pub fn state(&self) -> [u64; 2] {
        self.s
    }
}

#[inline]
fn splitmix64(cursor: &mut u64) -> u64 {
    *cursor = cursor.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *cursor;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for `round` of the match in `room`.
///
/// Host and client both know the room code and round number, so they agree
/// on the seed without sending it.
pub fn derive_seed(room: &str, round: u32) -> u64 {
    let digest = Sha256::new()
        .chain_update(SEED_DOMAIN)
        .chain_update(room.as_bytes())
        .chain_update(round.to_le_bytes())
        .finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = DeterministicRng::new(0xC0FFEE);
        let mut b = DeterministicRng::new(0xC0FFEE);
        let xs: Vec<u64> = (0..256).map(|_| a.next_u64()).collect();
        let ys: Vec<u64> = (0..256).map(|_| b.next_u64()).collect();
        assert_eq!(xs, ys);

        let mut c = DeterministicRng::new(0xC0FFEF);
        assert_ne!(c.next_u64(), xs[0]);
    }

    #[test]
    fn test_zero_seed_is_usable() {
        let mut rng = DeterministicRng::new(0);
        let first = rng.next_u64();
        assert!((0..8).any(|_| rng.next_u64() != first));
    }

    #[test]
    fn test_bounded_draws() {
        let mut rng = DeterministicRng::new(41);
        for _ in 0..500 {
            assert!(rng.next_int(3) < 3);
            let f = rng.next_f32();
            assert!((0.0..1.0).contains(&f));
            let spark = rng.next_f32_range(-4.0, 4.0);
            assert!((-4.0..4.0).contains(&spark));
        }
        assert_eq!(rng.next_int(0), 0);
        assert_eq!(rng.next_f32_range(2.5, 2.5), 2.5);
        assert_eq!(rng.next_f32_range(5.0, 1.0), 5.0);
    }

    #[test]
    fn test_shuffle_is_a_seeded_permutation() {
        let mut deck: Vec<u32> = (0..12).collect();
        let mut again = deck.clone();
        DeterministicRng::new(99).shuffle(&mut deck);
        DeterministicRng::new(99).shuffle(&mut again);
        assert_eq!(deck, again);

        deck.sort_unstable();
        assert_eq!(deck, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_round_seeds() {
        assert_eq!(derive_seed("room", 3), derive_seed("room", 3));
        assert_ne!(derive_seed("room", 3), derive_seed("room", 4));
        assert_ne!(derive_seed("room", 3), derive_seed("moor", 3));
    }
}
