//! Per-character ability module contract.
//!
//! A kit bundles one character's static ability metadata, its AI hook, its
//! cast hook and its passive updater. Default methods delegate to the
//! generic decision heuristic and ability resolver, so a data-only kit works
//! without overriding anything.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ability::{AbilityDefinition, AbilityId, AbilityOutcome};
use crate::combatant::{ActionRequest, Combatant, CombatantView};
use crate::decision::{self, Decision, DecisionContext};
use crate::resolve::{self, ActionContext, ResolveError};
use crate::resources::ResourceDeclaration;
use crate::state::{CombatantId, CombatantState, Seconds};
use crate::status::{EffectHandle, TimedEffectSpec};

/// Kits keyed by the combatant they drive.
pub type KitTable = BTreeMap<CombatantId, Arc<dyn AbilityKit>>;

pub trait AbilityKit: Send + Sync {
    fn name(&self) -> &str;

    /// Static ability metadata. Need not include the built-in basic attack.
    fn abilities(&self) -> &[AbilityDefinition];

    /// Resources the character starts with.
    fn resources(&self) -> &[ResourceDeclaration] {
        &[]
    }

    fn parsed_ability(&self, id: &AbilityId) -> Option<&AbilityDefinition> {
        self.abilities().iter().find(|a| &a.id == id)
    }

    /// Chooses the next action. Must always return a castable decision.
    fn decide_action(&self, ctx: &DecisionContext<'_>) -> Decision {
        decision::decide(self.abilities(), ctx)
    }

    fn execute_action(
        &self,
        decision: &Decision,
        ctx: &mut ActionContext<'_>,
    ) -> Result<Vec<AbilityOutcome>, ResolveError> {
        resolve::resolve(ctx, &decision.ability, &decision.targets)
    }

    /// Runs once per engine tick for this character, before any decision.
    fn update_passives(&self, _ctx: &mut PassiveContext<'_>) {}

    /// Handles `Script` payloads emitted by this kit's abilities and effects.
    fn on_script(
        &self,
        _invocation: &ScriptInvocation,
        _ctx: &mut ActionContext<'_>,
    ) -> Vec<AbilityOutcome> {
        Vec::new()
    }
}

/// What fired a script hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptTrigger {
    Cast,
    Scheduled,
    ChannelPulse,
    ChannelResolution,
    EffectTick,
    EffectExpiry,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptInvocation {
    pub hook: u32,
    pub trigger: ScriptTrigger,
    /// Originating ability, when the hook came from a cast.
    pub ability: Option<AbilityId>,
    /// Targets of the cast, or the effect owner for effect hooks.
    pub targets: Vec<CombatantId>,
    /// Resource consumed by the cast, or `magnitude × stacks` for effect hooks.
    pub amount: f64,
}

/// Self-scoped view handed to [`AbilityKit::update_passives`].
///
/// A passive may mutate only its own combatant's effects, resources,
/// cooldowns and HP. Other combatants are visible as read-only snapshots.
pub struct PassiveContext<'a> {
    pub actor: CombatantId,
    pub dt: Seconds,
    pub now: Seconds,
    pub me: &'a mut CombatantState,
    pub combatant: &'a mut dyn Combatant,
    pub allies: &'a [CombatantView],
    pub enemies: &'a [CombatantView],
}

impl PassiveContext<'_> {
    pub fn view(&self) -> CombatantView {
        CombatantView::of(&*self.combatant)
    }

    pub fn hp_fraction(&self) -> f64 {
        self.view().hp_fraction()
    }

    pub fn apply_self(&mut self, spec: TimedEffectSpec) -> Option<EffectHandle> {
        self.me.effects.apply(spec.from_source(self.actor))
    }

    /// Heals the combatant itself. Returns the amount actually restored.
    pub fn heal_self(&mut self, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        self.combatant
            .receive_action(&ActionRequest::heal(self.actor, amount))
            .amount
    }
}
