//! Deterministic randomness for target picks and hit rolls.
//!
//! Randomness is a pure function of a seed: identical battle seed, action
//! nonce, actor and roll context always produce the same value, so a battle
//! replays identically from its inputs.

use crate::state::CombatantId;

/// Seed-driven random source.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Uniform float in `[0, 1)`.
    fn unit(&self, seed: u64) -> f64 {
        f64::from(self.next_u32(seed)) / (f64::from(u32::MAX) + 1.0)
    }

    /// Returns true with the given probability (clamped to `[0, 1]`).
    fn chance(&self, seed: u64, probability: f64) -> bool {
        if !probability.is_finite() || probability <= 0.0 {
            return false;
        }
        self.unit(seed) < probability.min(1.0)
    }

    /// Picks an index in `[0, len)`; returns `None` for empty collections.
    fn pick_index(&self, seed: u64, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.next_u32(seed) as usize % len)
    }
}

/// PCG-XSH-RR generator: 64-bit LCG state, 32-bit permuted output.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::output(Self::step(seed))
    }
}

/// Roll contexts, so that independent rolls of one action never share a seed.
pub mod roll {
    pub const TARGET: u32 = 0;
    pub const EVADE: u32 = 1;
    pub const CRIT: u32 = 2;
}

/// Mixes the battle seed, action nonce, actor and roll context into one seed.
pub fn compute_seed(battle_seed: u64, nonce: u64, actor: CombatantId, context: u32) -> u64 {
    let mut hash = battle_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= u64::from(actor.0).wrapping_mul(0x517cc1b727220a95);
    hash ^= u64::from(context).wrapping_mul(0x85ebca6b);

    // SplitMix-style avalanche
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}
