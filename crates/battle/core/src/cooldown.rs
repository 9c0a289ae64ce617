//! Cooldown Table: per-ability timers gating re-use.

use std::collections::{BTreeMap, BTreeSet};

use crate::ability::AbilityId;
use crate::config::EngineConfig;
use crate::state::Seconds;

const EPSILON: f64 = EngineConfig::TIME_EPSILON;

/// Remaining cooldowns of one combatant.
///
/// An ability is ready iff it has no entry. Entries are removed as soon as
/// their remaining time reaches zero, so every stored value is positive.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownTable {
    entries: BTreeMap<AbilityId, Seconds>,
    /// One-shot tokens: the next cast of these abilities starts no cooldown.
    free_casts: BTreeSet<AbilityId>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or overwrites) the remaining cooldown.
    pub fn start(&mut self, ability: &AbilityId, seconds: Seconds) {
        if seconds.is_finite() && seconds > EPSILON {
            self.entries.insert(ability.clone(), seconds);
        } else {
            self.entries.remove(ability);
        }
    }

    /// Lowers the remaining cooldown, floored at zero.
    pub fn reduce(&mut self, ability: &AbilityId, seconds: Seconds) {
        if !seconds.is_finite() || seconds <= 0.0 {
            return;
        }
        if let Some(remaining) = self.entries.get_mut(ability) {
            *remaining -= seconds;
            if *remaining <= EPSILON {
                self.entries.remove(ability);
            }
        }
    }

    /// Lowers every cooldown by `seconds`.
    pub fn reduce_all(&mut self, seconds: Seconds) {
        self.tick(seconds);
    }

    pub fn is_ready(&self, ability: &AbilityId) -> bool {
        !self.entries.contains_key(ability)
    }

    pub fn remaining(&self, ability: &AbilityId) -> Seconds {
        self.entries.get(ability).copied().unwrap_or(0.0)
    }

    /// Decrements all entries, dropping those that reach zero.
    pub fn tick(&mut self, dt: Seconds) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.entries.retain(|_, remaining| {
            *remaining -= dt;
            *remaining > EPSILON
        });
    }

    /// Grants a free follow-up: the next successful cast of `ability` does
    /// not start its cooldown.
    ///
    /// The token also lets that cast through while a cooldown is running;
    /// the running cooldown is left untouched.
    pub fn grant_free_cast(&mut self, ability: &AbilityId) {
        self.free_casts.insert(ability.clone());
    }

    /// Consumes a free-cast token if one is present.
    pub fn take_free_cast(&mut self, ability: &AbilityId) -> bool {
        self.free_casts.remove(ability)
    }

    pub fn has_free_cast(&self, ability: &AbilityId) -> bool {
        self.free_casts.contains(ability)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.free_casts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AbilityId, Seconds)> {
        self.entries.iter().map(|(id, remaining)| (id, *remaining))
    }
}
