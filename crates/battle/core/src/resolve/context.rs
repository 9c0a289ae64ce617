//! Execution context shared by casts, channel steps, scheduled payloads and
//! kit scripts.

use crate::ability::{AbilityId, AbilityOutcome, formula};
use crate::combatant::{
    ActionReceipt, ActionRequest, Arena, Element, OutcomeKind, Presenter, StatKey, TextStyle,
};
use crate::config::EngineConfig;
use crate::kit::{KitTable, ScriptInvocation};
use crate::resources::ResourceLedger;
use crate::state::{BattleState, CombatantId, Seconds};
use crate::status::{EffectHandle, EffectKind, EffectRegistry, EffectTags, TimedEffectSpec};

const EPSILON: f64 = EngineConfig::TIME_EPSILON;

/// Everything an action needs, passed explicitly.
///
/// `actor` is the combatant on whose behalf the work runs. Resource helpers
/// only ever touch the actor's own ledger; other combatants can only be
/// reached through damage, healing and effect application.
pub struct ActionContext<'a> {
    pub actor: CombatantId,
    pub state: &'a mut BattleState,
    pub arena: &'a mut dyn Arena,
    pub ui: &'a mut dyn Presenter,
    pub kits: &'a KitTable,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        actor: CombatantId,
        state: &'a mut BattleState,
        arena: &'a mut dyn Arena,
        ui: &'a mut dyn Presenter,
        kits: &'a KitTable,
    ) -> Self {
        Self {
            actor,
            state,
            arena,
            ui,
            kits,
        }
    }

    pub fn now(&self) -> Seconds {
        self.state.now()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// True when `id` is registered, not removed and alive in the arena.
    pub fn is_valid_target(&self, id: CombatantId) -> bool {
        self.state.combatant(id).is_some_and(|s| s.is_active()) && self.arena.is_alive(id)
    }

    /// Base stat from the combatant model scaled by active `StatModifier` effects.
    pub fn effective_stat(&self, id: CombatantId, stat: StatKey) -> f64 {
        let base = self.arena.combatant(id).map_or(0.0, |c| c.stat(stat));
        let bonus = self
            .state
            .combatant(id)
            .map_or(0.0, |s| s.effects.stat_bonus(stat));
        formula::effective_stat(base, bonus)
    }

    pub fn effects_of(&self, id: CombatantId) -> Option<&EffectRegistry> {
        self.state.combatant(id).map(|s| &s.effects)
    }

    /// The actor's own resources.
    pub fn resources(&self) -> Option<&ResourceLedger> {
        self.state.combatant(self.actor).map(|s| &s.resources)
    }

    pub fn resource(&self, name: &str) -> f64 {
        self.resources().map_or(0.0, |r| r.get(name))
    }

    // ========================================================================
    // Self-scoped mutation
    // ========================================================================

    /// Adds to one of the actor's resources, clamped to `[0, cap]`.
    pub fn gain_resource(&mut self, name: &str, amount: f64, cap: f64) -> f64 {
        match self.state.combatant_mut(self.actor) {
            Some(state) if state.is_active() => state.resources.add(name, amount, cap),
            _ => 0.0,
        }
    }

    /// Consumes up to `amount` of the actor's resource. Returns what was taken.
    pub fn consume_resource(&mut self, name: &str, amount: f64) -> f64 {
        match self.state.combatant_mut(self.actor) {
            Some(state) if state.is_active() => state.resources.consume(name, amount),
            _ => 0.0,
        }
    }

    pub fn refund_cooldown(&mut self, ability: &AbilityId, seconds: Seconds) {
        if let Some(state) = self.state.combatant_mut(self.actor) {
            state.cooldowns.reduce(ability, seconds);
        }
    }

    pub fn grant_free_cast(&mut self, ability: &AbilityId) {
        if let Some(state) = self.state.combatant_mut(self.actor) {
            state.cooldowns.grant_free_cast(ability);
        }
    }

    // ========================================================================
    // Outcomes on targets
    // ========================================================================

    /// Applies an effect sourced from the actor. Inactive targets are skipped.
    pub fn apply_effect(
        &mut self,
        target: CombatantId,
        spec: TimedEffectSpec,
    ) -> Option<EffectHandle> {
        if !self.is_valid_target(target) {
            return None;
        }
        let spec = spec.from_source(self.actor);
        let visible = !spec.effective_tags().contains(EffectTags::HIDDEN);
        let label = spec.kind.label().to_string();

        let handle = self.state.apply_effect(target, spec)?;
        if visible {
            self.ui.show_floating_text(target, &label, TextStyle::Status);
        }
        Some(handle)
    }

    /// Removes dispellable harmful effects from `target`.
    pub fn cleanse(&mut self, target: CombatantId) -> usize {
        if !self.is_valid_target(target) {
            return 0;
        }
        self.state
            .combatant_mut(target)
            .map_or(0, |s| s.effects.cleanse_harmful())
    }

    /// Ability damage from the actor: carries its accuracy and crit chance.
    pub fn deal_damage(
        &mut self,
        target: CombatantId,
        amount: f64,
        element: Option<Element>,
    ) -> Option<AbilityOutcome> {
        let mut request = ActionRequest::damage(self.actor, amount);
        request.element = element;
        if self.arena.combatant(self.actor).is_some() {
            request.attacker_accuracy = Some(self.effective_stat(self.actor, StatKey::Accuracy));
            request.attacker_crit_chance =
                Some(self.effective_stat(self.actor, StatKey::CritChance));
        }
        self.hit(target, request)
    }

    pub fn heal(&mut self, target: CombatantId, amount: f64) -> Option<AbilityOutcome> {
        self.hit(target, ActionRequest::heal(self.actor, amount))
    }

    /// Records `amount` of absorption on `target` as a `Shield` effect.
    pub fn grant_shield(
        &mut self,
        target: CombatantId,
        amount: f64,
        duration: Seconds,
    ) -> Option<AbilityOutcome> {
        if !amount.is_finite() || amount <= 0.0 {
            return None;
        }
        let spec = TimedEffectSpec::new(EffectKind::Shield, amount, duration);
        self.apply_effect(target, spec)?;
        self.ui
            .show_floating_text(target, &format!("+{amount:.0}"), TextStyle::Shield);
        Some(AbilityOutcome::new(
            target,
            amount,
            OutcomeKind::Shield,
            false,
            false,
        ))
    }

    /// Delivers a damage or heal request to `target`.
    ///
    /// Damage is absorbed by shields first; only the remainder reaches the
    /// combatant model. Returns `None` for inactive targets and non-positive
    /// amounts.
    pub fn hit(&mut self, target: CombatantId, request: ActionRequest) -> Option<AbilityOutcome> {
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return None;
        }
        if !self.is_valid_target(target) {
            tracing::debug!(%target, source = %request.source, "skipping inactive target");
            return None;
        }

        match request.kind {
            OutcomeKind::Damage => {
                // Evasion is rolled by the combatant after shields soak the hit,
                // so keep the pre-hit shields around to refund a miss.
                let shields = self
                    .state
                    .combatant(target)
                    .filter(|s| s.effects.shield_total() > 0.0)
                    .map(|s| s.effects.clone());
                let mut absorbed = self
                    .state
                    .combatant_mut(target)
                    .map_or(0.0, |s| s.effects.absorb(request.amount));
                let remainder = request.amount - absorbed;

                let receipt = if remainder > EPSILON {
                    let request = ActionRequest {
                        amount: remainder,
                        ..request
                    };
                    self.receive(target, &request)
                } else {
                    ActionReceipt::default()
                };

                let mut amount = absorbed + receipt.amount;
                if receipt.was_evaded {
                    if let (Some(shields), Some(state)) =
                        (shields, self.state.combatant_mut(target))
                    {
                        state.effects = shields;
                    }
                    absorbed = 0.0;
                    amount = 0.0;
                }

                let outcome = AbilityOutcome::new(
                    target,
                    amount,
                    OutcomeKind::Damage,
                    receipt.was_evaded,
                    receipt.was_critical,
                );
                self.present(&outcome, absorbed);
                Some(outcome)
            }
            OutcomeKind::Heal => {
                let receipt = self.receive(target, &request);
                let outcome = AbilityOutcome::from_receipt(target, OutcomeKind::Heal, receipt);
                self.present(&outcome, 0.0);
                Some(outcome)
            }
            OutcomeKind::Shield => self.grant_shield(target, request.amount, Seconds::INFINITY),
        }
    }

    // ========================================================================
    // Kit hooks
    // ========================================================================

    /// Runs a kit-defined hook owned by `owner`'s kit, with `owner` as actor.
    ///
    /// Unknown owners (system-sourced effects, unregistered kits) are ignored.
    pub fn run_script(
        &mut self,
        owner: CombatantId,
        invocation: &ScriptInvocation,
    ) -> Vec<AbilityOutcome> {
        let Some(kit) = self.kits.get(&owner).cloned() else {
            tracing::debug!(%owner, hook = invocation.hook, "no kit for script hook");
            return Vec::new();
        };

        let previous = std::mem::replace(&mut self.actor, owner);
        let outcomes = kit.on_script(invocation, self);
        self.actor = previous;
        outcomes
    }

    fn receive(&mut self, target: CombatantId, request: &ActionRequest) -> ActionReceipt {
        self.arena
            .combatant_mut(target)
            .map(|c| c.receive_action(request))
            .unwrap_or_default()
    }

    fn present(&mut self, outcome: &AbilityOutcome, absorbed: f64) {
        let target = outcome.target();
        if outcome.was_evaded() {
            self.ui.show_floating_text(target, "Miss", TextStyle::Evade);
            return;
        }
        match outcome.kind() {
            OutcomeKind::Heal => {
                self.ui.show_floating_text(
                    target,
                    &format!("+{:.0}", outcome.amount()),
                    TextStyle::Heal,
                );
            }
            OutcomeKind::Damage if absorbed > 0.0 && outcome.amount() <= absorbed => {
                self.ui.show_floating_text(
                    target,
                    &format!("({absorbed:.0})"),
                    TextStyle::Shield,
                );
            }
            _ => {
                let style = if outcome.was_critical() {
                    TextStyle::Critical
                } else {
                    TextStyle::Damage
                };
                self.ui
                    .show_floating_text(target, &format!("{:.0}", outcome.amount()), style);
            }
        }
    }
}
