use battle_core::ability::formula;
use battle_core::{
    AbilityDefinition, AbilityKit, AbilityOutcome, ActionContext, CombatantId, PassiveContext,
    ResourceDeclaration, ScriptInvocation, TimedEffectSpec,
};

use super::definition::{KitDefinition, PassiveSpec, ScriptAction};

/// [`AbilityKit`] driven entirely by a [`KitDefinition`].
///
/// Decisions and casts use the engine defaults; passives and script hooks
/// are interpreted from the definition.
#[derive(Clone, Debug)]
pub struct ScriptedKit {
    definition: KitDefinition,
}

impl ScriptedKit {
    pub fn new(definition: KitDefinition) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &KitDefinition {
        &self.definition
    }
}

impl AbilityKit for ScriptedKit {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn abilities(&self) -> &[AbilityDefinition] {
        &self.definition.abilities
    }

    fn resources(&self) -> &[ResourceDeclaration] {
        &self.definition.resources
    }

    fn update_passives(&self, ctx: &mut PassiveContext<'_>) {
        for passive in &self.definition.passives {
            run_passive(passive, ctx);
        }
    }

    fn on_script(
        &self,
        invocation: &ScriptInvocation,
        ctx: &mut ActionContext<'_>,
    ) -> Vec<AbilityOutcome> {
        let Some(action) = self.definition.script(invocation.hook) else {
            tracing::warn!(
                kit = %self.definition.name,
                hook = invocation.hook,
                "unbound script hook"
            );
            return Vec::new();
        };
        run_script(action, invocation, ctx)
    }
}

fn run_passive(passive: &PassiveSpec, ctx: &mut PassiveContext<'_>) {
    match passive {
        PassiveSpec::Regenerate {
            resource,
            per_second,
        } => {
            ctx.me.resources.gain(resource, per_second * ctx.dt);
        }
        PassiveSpec::Recover { per_second, below } => {
            if ctx.hp_fraction() < *below {
                let max_hp = ctx.view().max_hp;
                ctx.heal_self(per_second * max_hp * ctx.dt);
            }
        }
        PassiveSpec::Aura { kind, magnitude } => {
            if !ctx.me.effects.has(kind) {
                ctx.apply_self(TimedEffectSpec::permanent(kind.clone(), *magnitude));
            }
        }
        PassiveSpec::Enrage { threshold, spec } => {
            if ctx.hp_fraction() < *threshold && !ctx.me.effects.has(&spec.kind) {
                tracing::debug!(actor = %ctx.actor, kind = ?spec.kind, "enraged");
                ctx.apply_self(spec.clone());
            }
        }
    }
}

fn run_script(
    action: &ScriptAction,
    invocation: &ScriptInvocation,
    ctx: &mut ActionContext<'_>,
) -> Vec<AbilityOutcome> {
    let actor = ctx.actor;
    let targets: Vec<CombatantId> = invocation
        .targets
        .iter()
        .copied()
        .filter(|t| ctx.is_valid_target(*t))
        .collect();

    match action {
        ScriptAction::Detonate {
            effect,
            scaling,
            element,
        } => {
            let stat = ctx.effective_stat(actor, scaling.stat);
            let per_stack = formula::magnitude(scaling, stat, 0.0);
            let mut outcomes = Vec::new();
            for target in targets {
                let stacks = ctx
                    .state
                    .combatant_mut(target)
                    .map_or(0, |s| s.effects.consume_stacks_from(effect, actor, u32::MAX));
                if stacks > 0 {
                    let amount = per_stack * f64::from(stacks);
                    outcomes.extend(ctx.deal_damage(target, amount, *element));
                }
            }
            outcomes
        }
        ScriptAction::Execute { threshold, scaling } => {
            let stat = ctx.effective_stat(actor, scaling.stat);
            let amount = formula::magnitude(scaling, stat, 0.0);
            let wounded: Vec<CombatantId> = targets
                .into_iter()
                .filter(|t| {
                    ctx.arena
                        .view(*t)
                        .is_some_and(|v| v.hp_fraction() < *threshold)
                })
                .collect();
            wounded
                .into_iter()
                .filter_map(|t| ctx.deal_damage(t, amount, None))
                .collect()
        }
        ScriptAction::Burst { ratio, element } => {
            let amount = invocation.amount * ratio;
            targets
                .into_iter()
                .filter_map(|t| ctx.deal_damage(t, amount, *element))
                .collect()
        }
        ScriptAction::GainPerTarget {
            resource,
            amount,
            cap,
        } => {
            ctx.gain_resource(resource, amount * targets.len() as f64, *cap);
            Vec::new()
        }
    }
}
