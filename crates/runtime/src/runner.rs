//! Reference scheduler.
//!
//! [`BattleRunner`] drives a [`BattleEngine`] over a [`SimArena`] the way a
//! host battle loop would: fixed real-time steps, then one action for every
//! combatant whose slot came due. A combatant's slot interval shrinks with
//! its `Speed` stat. Rejected casts (stun, cooldown, missing resources) cost
//! the slot.

use std::collections::BTreeMap;
use std::sync::Arc;

use battle_core::{
    AbilityKit, Arena, BattleEngine, Combatant, CombatantId, EngineConfig, EngineError, Seconds,
    StatKey, Team, TickSummary,
};

use crate::config::RunnerConfig;
use crate::digest;
use crate::error::{Result, RuntimeError};
use crate::events::{BusPresenter, CombatEvent, EventBus};
use crate::sim::{SimArena, SimCombatant};

/// How a battle ended.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleReport {
    /// The last team standing; `None` on a timeout or mutual wipe.
    pub winner: Option<Team>,
    pub elapsed: Seconds,
    pub steps: u64,
    pub actions: u64,
    /// Hex SHA-256 of the final engine state.
    pub digest: String,
}

pub struct BattleRunner {
    engine: BattleEngine,
    arena: SimArena,
    config: RunnerConfig,
    bus: EventBus,
    ready_at: BTreeMap<CombatantId, Seconds>,
    steps: u64,
    actions: u64,
}

impl BattleRunner {
    pub fn new(config: RunnerConfig, engine_config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = BattleEngine::new(engine_config, config.seed);
        engine.set_speed_multiplier(config.speed_multiplier);
        Ok(Self {
            engine,
            arena: SimArena::new(),
            config,
            bus: EventBus::new(),
            ready_at: BTreeMap::new(),
            steps: 0,
            actions: 0,
        })
    }

    /// Publishes to `bus` instead of a private one.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Puts a combatant on the field, driven by `kit`. Its first slot is due
    /// immediately.
    pub fn add(&mut self, combatant: SimCombatant, kit: Arc<dyn AbilityKit>) -> Result<()> {
        let id = combatant.id();
        if !self.arena.insert(combatant) {
            return Err(RuntimeError::DuplicateCombatant(id));
        }
        self.engine.register(id, kit);
        self.ready_at.insert(id, self.engine.now());
        Ok(())
    }

    pub fn engine(&self) -> &BattleEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut BattleEngine {
        &mut self.engine
    }

    pub fn arena(&self) -> &SimArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut SimArena {
        &mut self.arena
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn now(&self) -> Seconds {
        self.engine.now()
    }

    pub fn winner(&self) -> Option<Team> {
        match self.arena.living_teams().as_slice() {
            [team] => Some(*team),
            _ => None,
        }
    }

    /// True once at most one team is standing or the time limit is reached.
    pub fn is_finished(&self) -> bool {
        self.arena.living_teams().len() <= 1
            || self.engine.now() + EngineConfig::TIME_EPSILON >= self.config.max_duration
    }

    /// Advances the engine by one tick, then runs every due action slot.
    pub fn step(&mut self) -> TickSummary {
        let mut ui = BusPresenter::new(&self.bus);
        let summary = self
            .engine
            .advance(self.config.tick_seconds, &mut self.arena, &mut ui);
        self.steps += 1;

        if !summary.outcomes.is_empty() {
            self.bus.combat(CombatEvent::Ticked {
                now: summary.now,
                outcomes: summary.outcomes.clone(),
            });
        }
        for id in &summary.retired {
            self.ready_at.remove(id);
            tracing::debug!(%id, now = summary.now, "combatant down");
            self.bus.combat(CombatEvent::Retired { id: *id });
        }

        if summary.dt > 0.0 {
            self.take_turns();
        }
        summary
    }

    fn take_turns(&mut self) {
        let now = self.engine.now();
        let due: Vec<CombatantId> = self
            .ready_at
            .iter()
            .filter(|(_, at)| **at <= now + EngineConfig::TIME_EPSILON)
            .map(|(id, _)| *id)
            .collect();

        for id in due {
            if self.is_finished() {
                break;
            }
            if !self.arena.is_alive(id) {
                continue;
            }

            let mut ui = BusPresenter::new(&self.bus);
            match self.engine.act(id, &mut self.arena, &mut ui) {
                Ok(report) => {
                    self.actions += 1;
                    tracing::trace!(
                        actor = %id,
                        ability = %report.decision.ability,
                        outcomes = report.outcomes.len(),
                        "action"
                    );
                    self.bus.combat(CombatEvent::Acted {
                        actor: id,
                        ability: report.decision.ability,
                        outcomes: report.outcomes,
                    });
                }
                Err(err) => {
                    tracing::debug!(actor = %id, code = err.error_code(), %err, "slot skipped");
                    self.bus.combat(CombatEvent::ActionFailed {
                        actor: id,
                        code: err.error_code(),
                        reason: err.to_string(),
                    });
                }
            }
            self.ready_at.insert(id, now + self.slot_interval(id));
        }
    }

    fn slot_interval(&self, id: CombatantId) -> Seconds {
        let speed = self
            .arena
            .get(id)
            .map_or(0.0, |c| c.stat(StatKey::Speed).max(0.0));
        self.config.attack_interval * 100.0 / (100.0 + speed)
    }

    /// Runs the battle to completion.
    pub fn run(&mut self) -> Result<BattleReport> {
        if self.arena.is_empty() {
            return Err(RuntimeError::EmptyRoster);
        }
        tracing::info!(
            seed = self.config.seed,
            combatants = self.arena.len(),
            "battle started"
        );
        self.bus.combat(CombatEvent::Started {
            seed: self.config.seed,
            combatants: self.arena.len(),
        });

        while !self.is_finished() {
            let summary = self.step();
            if summary.dt <= 0.0 {
                return Err(RuntimeError::Stalled { now: summary.now });
            }
        }
        self.finish()
    }

    fn finish(&self) -> Result<BattleReport> {
        let digest = digest::state_digest_hex(self.engine.state())?;
        let report = BattleReport {
            winner: self.winner(),
            elapsed: self.engine.now(),
            steps: self.steps,
            actions: self.actions,
            digest,
        };
        tracing::info!(
            winner = ?report.winner,
            elapsed = report.elapsed,
            actions = report.actions,
            digest = digest::short(&report.digest),
            "battle finished"
        );
        self.bus.combat(CombatEvent::Finished {
            winner: report.winner,
            elapsed: report.elapsed,
            digest: report.digest.clone(),
        });
        Ok(report)
    }
}
