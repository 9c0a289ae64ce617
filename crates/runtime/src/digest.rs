//! State digests for determinism checks.
//!
//! Two runs from the same seed, roster and kits must end with identical
//! digests. The engine state only holds ordered maps, so its bincode
//! encoding is stable.

use battle_core::BattleState;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// SHA-256 over the bincode encoding of the engine state.
pub fn state_digest(state: &BattleState) -> Result<[u8; 32]> {
    let bytes = bincode::serialize(state)?;
    Ok(Sha256::digest(&bytes).into())
}

/// [`state_digest`] as lowercase hex.
pub fn state_digest_hex(state: &BattleState) -> Result<String> {
    state_digest(state).map(hex::encode)
}

/// Short prefix for log lines.
pub fn short(digest: &str) -> &str {
    digest.get(..16).unwrap_or(digest)
}
