//! Scheduled payloads keyed by simulated time.
//!
//! Delayed bonus hits, travel-time projectiles and other deferred work are
//! queued here instead of on platform timers, so pause and speed scaling
//! affect them exactly like every other effect.

use crate::ability::{AbilityId, Payload};
use crate::config::EngineConfig;
use crate::state::{CombatantId, Seconds};

/// A payload waiting for its due time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduledAction {
    pub due_at: Seconds,
    /// Insertion order; breaks ties between entries due at the same time.
    pub seq: u64,
    pub actor: CombatantId,
    pub ability: AbilityId,
    pub targets: Vec<CombatantId>,
    pub payload: Payload,
    /// Resource consumed by the originating cast, for `per_consumed` scaling.
    pub consumed: f64,
}

/// Queue ordered by `(due_at, seq)`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timeline {
    entries: Vec<ScheduledAction>,
    next_seq: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `payload` to fire at `due_at`. Returns the entry's sequence number.
    pub fn schedule(
        &mut self,
        due_at: Seconds,
        actor: CombatantId,
        ability: AbilityId,
        targets: Vec<CombatantId>,
        payload: Payload,
        consumed: f64,
    ) -> u64 {
        let due_at = if due_at.is_finite() { due_at } else { 0.0 };
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = ScheduledAction {
            due_at,
            seq,
            actor,
            ability,
            targets,
            payload,
            consumed,
        };
        let idx = self
            .entries
            .partition_point(|e| (e.due_at, e.seq) <= (entry.due_at, entry.seq));
        self.entries.insert(idx, entry);
        seq
    }

    /// Removes and returns every entry due at or before `now`, in order.
    pub fn drain_due(&mut self, now: Seconds) -> Vec<ScheduledAction> {
        let split = self
            .entries
            .partition_point(|e| e.due_at <= now + EngineConfig::TIME_EPSILON);
        self.entries.drain(..split).collect()
    }

    /// Drops every entry scheduled by `actor`. Returns how many were dropped.
    pub fn cancel_actor(&mut self, actor: CombatantId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.actor != actor);
        before - self.entries.len()
    }

    pub fn next_due(&self) -> Option<Seconds> {
        self.entries.first().map(|e| e.due_at)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledAction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
