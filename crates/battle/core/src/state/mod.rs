//! Authoritative per-battle engine state.
//!
//! The engine owns the effect registries, resource ledgers, cooldown tables
//! and channel slots of every registered combatant, plus the shared clock and
//! timeline. HP and stats stay with the host's combatant model.
mod common;

use std::collections::BTreeMap;

pub use common::{CombatantId, Position, Seconds, Team};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::cooldown::CooldownTable;
use crate::resolve::ChannelState;
use crate::resources::{ResourceDeclaration, ResourceLedger};
use crate::status::{EffectHandle, EffectRegistry, TimedEffectSpec};
use crate::timeline::Timeline;

/// Engine-owned bookkeeping for one combatant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantState {
    pub effects: EffectRegistry,
    pub resources: ResourceLedger,
    pub cooldowns: CooldownTable,
    pub channel: ChannelState,
    /// Set once the combatant has died or left the battle. Removed combatants
    /// ignore every further mutation.
    pub removed: bool,
}

impl CombatantState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            effects: EffectRegistry::with_min_tick_interval(config.min_tick_interval),
            ..Self::default()
        }
    }

    pub fn with_resources<'a>(
        config: &EngineConfig,
        declarations: impl IntoIterator<Item = &'a ResourceDeclaration>,
    ) -> Self {
        let mut state = Self::new(config);
        for declaration in declarations {
            state.resources.declare(declaration);
        }
        state
    }

    pub fn is_active(&self) -> bool {
        !self.removed
    }

    /// Marks the combatant as gone: clears its effects and cancels any channel.
    pub fn retire(&mut self) {
        self.removed = true;
        self.effects.clear();
        self.channel.cancel();
    }
}

/// Canonical snapshot of a running battle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleState {
    /// Seed for every random roll, fixed at battle start.
    pub seed: u64,

    /// Incremented once per resolved cast; mixed into roll seeds.
    pub nonce: u64,

    pub clock: Clock,
    pub timeline: Timeline,
    pub combatants: BTreeMap<CombatantId, CombatantState>,
}

impl BattleState {
    pub fn new(config: &EngineConfig, seed: u64) -> Self {
        Self {
            seed,
            nonce: 0,
            clock: Clock::from_config(config),
            timeline: Timeline::new(),
            combatants: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Seconds {
        self.clock.now()
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&CombatantState> {
        self.combatants.get(&id)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut CombatantState> {
        self.combatants.get_mut(&id)
    }

    /// Combatants that have not been removed, in id order.
    pub fn active_ids(&self) -> Vec<CombatantId> {
        self.combatants
            .iter()
            .filter(|(_, state)| state.is_active())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Applies an effect to `target`.
    ///
    /// Unknown or removed targets are a silent no-op.
    pub fn apply_effect(
        &mut self,
        target: CombatantId,
        spec: TimedEffectSpec,
    ) -> Option<EffectHandle> {
        match self.combatants.get_mut(&target) {
            Some(state) if state.is_active() => state.effects.apply(spec),
            _ => {
                tracing::debug!(%target, kind = ?spec.kind, "effect dropped on inactive target");
                None
            }
        }
    }

    /// Retires `id` and drops its scheduled payloads. Returns `false` if it was
    /// already gone.
    pub fn retire(&mut self, id: CombatantId) -> bool {
        let Some(state) = self.combatants.get_mut(&id) else {
            return false;
        };
        if state.removed {
            return false;
        }
        state.retire();
        let cancelled = self.timeline.cancel_actor(id);
        tracing::debug!(%id, cancelled, "combatant retired");
        true
    }
}
