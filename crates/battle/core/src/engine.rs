//! Battle tick loop and cast entry points.
//!
//! [`BattleEngine`] owns the [`BattleState`] and the kits, and is the only
//! place simulated time advances. One call to [`BattleEngine::advance`]:
//!
//! 1. Scales the real delta by the clock (pause and speed multiplier)
//! 2. Retires combatants that died since the last tick
//! 3. Runs every kit's passive updater
//! 4. Decays resources, ticks cooldowns and effect registries
//! 5. Applies effect pulses (periodic and expiry payloads)
//! 6. Advances channels and applies their pulses and resolutions
//! 7. Fires due timeline entries
//!
//! Casts happen between ticks through [`BattleEngine::act`] or
//! [`BattleEngine::execute`], so a decision always sees post-tick state.

use std::sync::Arc;

use crate::ability::AbilityOutcome;
use crate::combatant::{Arena, CombatantView, Presenter};
use crate::config::EngineConfig;
use crate::decision::{self, Decision, DecisionContext};
use crate::kit::{AbilityKit, KitTable, PassiveContext, ScriptTrigger};
use crate::resolve::{self, ActionContext, ChannelPhase, ResolveError};
use crate::rng::{PcgRng, RngOracle};
use crate::state::{BattleState, CombatantId, CombatantState, Seconds};
use crate::status::{EffectHandle, EffectKind, EffectPulse, TimedEffectSpec};

/// What happened during one [`BattleEngine::advance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickSummary {
    /// Simulated seconds that elapsed.
    pub dt: Seconds,
    pub now: Seconds,
    pub outcomes: Vec<AbilityOutcome>,
    /// Effects that ran out, by owner.
    pub expired: Vec<(CombatantId, EffectKind)>,
    /// Combatants retired this tick.
    pub retired: Vec<CombatantId>,
}

/// Result of a full decide-then-execute turn.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionReport {
    pub decision: Decision,
    pub outcomes: Vec<AbilityOutcome>,
}

pub struct BattleEngine {
    state: BattleState,
    kits: KitTable,
    config: EngineConfig,
    rng: Box<dyn RngOracle>,
}

impl BattleEngine {
    pub fn new(config: EngineConfig, seed: u64) -> Self {
        Self {
            state: BattleState::new(&config, seed),
            kits: KitTable::new(),
            config,
            rng: Box::new(PcgRng),
        }
    }

    pub fn with_rng(mut self, rng: impl RngOracle + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn kit(&self, id: CombatantId) -> Option<&Arc<dyn AbilityKit>> {
        self.kits.get(&id)
    }

    pub fn now(&self) -> Seconds {
        self.state.now()
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f64) {
        self.state.clock.set_speed_multiplier(multiplier);
    }

    pub fn pause(&mut self) {
        self.state.clock.pause();
    }

    pub fn resume(&mut self) {
        self.state.clock.resume();
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Registers a combatant driven by `kit`, declaring the kit's resources.
    ///
    /// Re-registering an id replaces its kit and resets its engine state.
    pub fn register(&mut self, id: CombatantId, kit: Arc<dyn AbilityKit>) {
        let state = CombatantState::with_resources(&self.config, kit.resources());
        tracing::debug!(%id, kit = kit.name(), "combatant registered");
        self.state.combatants.insert(id, state);
        self.kits.insert(id, kit);
    }

    /// Takes a combatant out of the battle. Its pending work is cancelled;
    /// effects it applied to others keep running.
    pub fn remove(&mut self, id: CombatantId) -> bool {
        self.state.retire(id)
    }

    /// Pass-through for applying an effect from outside a cast (e.g. items,
    /// arena hazards). Removed targets are a no-op.
    pub fn apply_status(
        &mut self,
        target: CombatantId,
        spec: TimedEffectSpec,
    ) -> Option<EffectHandle> {
        self.state.apply_effect(target, spec)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the battle by `real_dt` wall seconds.
    ///
    /// A paused clock or non-positive delta changes nothing.
    pub fn advance(
        &mut self,
        real_dt: Seconds,
        arena: &mut dyn Arena,
        ui: &mut dyn Presenter,
    ) -> TickSummary {
        let dt = self.state.clock.advance(real_dt);
        let mut summary = TickSummary {
            dt,
            now: self.state.now(),
            ..TickSummary::default()
        };
        if dt <= 0.0 {
            return summary;
        }

        self.sweep(arena, &mut summary);
        self.run_passives(dt, arena);

        let pulses = self.tick_timers(dt, &mut summary);
        for pulse in &pulses {
            let mut ctx =
                ActionContext::new(pulse.source, &mut self.state, arena, ui, &self.kits);
            summary.outcomes.extend(resolve::apply_pulse(&mut ctx, pulse));
        }
        self.sweep(arena, &mut summary);

        self.advance_channels(dt, arena, ui, &mut summary);
        self.fire_timeline(arena, ui, &mut summary);
        self.sweep(arena, &mut summary);

        tracing::trace!(
            dt,
            now = summary.now,
            outcomes = summary.outcomes.len(),
            "engine tick"
        );
        summary
    }

    /// Retires registered combatants that are dead or missing in the arena.
    fn sweep(&mut self, arena: &dyn Arena, summary: &mut TickSummary) {
        for id in self.state.active_ids() {
            if !arena.is_alive(id) && self.state.retire(id) {
                summary.retired.push(id);
            }
        }
    }

    fn run_passives(&mut self, dt: Seconds, arena: &mut dyn Arena) {
        let now = self.state.now();
        let views = self.views(arena);

        for id in self.state.active_ids() {
            let Some(kit) = self.kits.get(&id).cloned() else {
                continue;
            };
            let Some(me_view) = views.iter().find(|v| v.id == id).copied() else {
                continue;
            };
            let (allies, enemies) = split_sides(&me_view, &views);
            let (Some(me), Some(combatant)) =
                (self.state.combatants.get_mut(&id), arena.combatant_mut(id))
            else {
                continue;
            };

            let mut ctx = PassiveContext {
                actor: id,
                dt,
                now,
                me,
                combatant,
                allies: &allies,
                enemies: &enemies,
            };
            kit.update_passives(&mut ctx);
        }
    }

    fn tick_timers(&mut self, dt: Seconds, summary: &mut TickSummary) -> Vec<EffectPulse> {
        let mut pulses = Vec::new();
        for (id, state) in self.state.combatants.iter_mut() {
            if !state.is_active() {
                continue;
            }
            state.resources.decay_tick(dt);
            state.cooldowns.tick(dt);

            let report = state.effects.tick(*id, dt);
            pulses.extend(report.pulses);
            summary
                .expired
                .extend(report.expired.into_iter().map(|e| (*id, e.kind)));
        }
        pulses
    }

    fn advance_channels(
        &mut self,
        dt: Seconds,
        arena: &mut dyn Arena,
        ui: &mut dyn Presenter,
        summary: &mut TickSummary,
    ) {
        for id in self.state.active_ids() {
            let steps = match self.state.combatant_mut(id) {
                Some(state) => state.channel.advance(dt),
                None => continue,
            };

            for step in steps {
                if !arena.is_alive(id) {
                    if self.state.retire(id) {
                        summary.retired.push(id);
                    }
                    break;
                }
                let trigger = match step.phase {
                    ChannelPhase::Resolution => ScriptTrigger::ChannelResolution,
                    _ => ScriptTrigger::ChannelPulse,
                };
                let mut ctx = ActionContext::new(id, &mut self.state, arena, ui, &self.kits);
                summary.outcomes.extend(resolve::apply_payloads(
                    &mut ctx,
                    &step.ability,
                    &step.payloads,
                    &step.targets,
                    step.consumed,
                    trigger,
                ));
            }
        }
    }

    fn fire_timeline(
        &mut self,
        arena: &mut dyn Arena,
        ui: &mut dyn Presenter,
        summary: &mut TickSummary,
    ) {
        let due = self.state.timeline.drain_due(self.state.now());
        for entry in due {
            let mut ctx =
                ActionContext::new(entry.actor, &mut self.state, arena, ui, &self.kits);
            if !ctx.is_valid_target(entry.actor) {
                tracing::debug!(
                    actor = %entry.actor,
                    ability = %entry.ability,
                    "scheduled payload dropped"
                );
                continue;
            }
            summary.outcomes.extend(resolve::apply_payloads(
                &mut ctx,
                &entry.ability,
                std::slice::from_ref(&entry.payload),
                &entry.targets,
                entry.consumed,
                ScriptTrigger::Scheduled,
            ));
        }
    }

    // ========================================================================
    // Decisions and casts
    // ========================================================================

    /// Runs the actor's decision hook. `None` if the actor is not registered
    /// or not present in the arena.
    pub fn decide(&self, actor: CombatantId, arena: &dyn Arena) -> Option<Decision> {
        let views = self.views(arena);
        let me = views.iter().find(|v| v.id == actor).copied()?;
        let (allies, enemies) = split_sides(&me, &views);

        let ctx = DecisionContext {
            actor: me,
            enemies: &enemies,
            allies: &allies,
            state: &self.state,
            rng: &*self.rng,
        };
        Some(match self.kits.get(&actor) {
            Some(kit) => kit.decide_action(&ctx),
            None => decision::decide(&[], &ctx),
        })
    }

    /// Executes a decision through the actor's kit.
    pub fn execute(
        &mut self,
        actor: CombatantId,
        decision: &Decision,
        arena: &mut dyn Arena,
        ui: &mut dyn Presenter,
    ) -> Result<Vec<AbilityOutcome>, ResolveError> {
        let kit = self.kits.get(&actor).cloned();
        let mut ctx = ActionContext::new(actor, &mut self.state, arena, ui, &self.kits);
        match kit {
            Some(kit) => kit.execute_action(decision, &mut ctx),
            None => resolve::resolve(&mut ctx, &decision.ability, &decision.targets),
        }
    }

    /// Decides and executes one action for `actor`.
    pub fn act(
        &mut self,
        actor: CombatantId,
        arena: &mut dyn Arena,
        ui: &mut dyn Presenter,
    ) -> Result<ActionReport, ResolveError> {
        let decision = self
            .decide(actor, arena)
            .ok_or(ResolveError::ActorNotFound(actor))?;
        let outcomes = self.execute(actor, &decision, arena, ui)?;
        Ok(ActionReport { decision, outcomes })
    }

    /// Snapshots of every active registered combatant present in the arena.
    fn views(&self, arena: &dyn Arena) -> Vec<CombatantView> {
        self.state
            .active_ids()
            .into_iter()
            .filter_map(|id| arena.view(id))
            .collect()
    }
}

/// Splits living combatants into the actor's allies (including itself) and
/// its enemies.
fn split_sides(
    me: &CombatantView,
    views: &[CombatantView],
) -> (Vec<CombatantView>, Vec<CombatantView>) {
    views
        .iter()
        .copied()
        .filter(|v| v.alive)
        .partition(|v| !v.team.is_hostile_to(me.team))
}
