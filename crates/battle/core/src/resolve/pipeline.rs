//! Cast orchestration.
//!
//! 1. Validate the actor, the ability, its cooldown and its hard cost
//! 2. Resolve targets, dropping dead or removed ones
//! 3. Commit: spend the cost, start the cooldown (or use a free cast)
//! 4. Apply immediate payloads to every still-valid target
//! 5. Start the channel and queue delayed payloads on the timeline
//!
//! Steps 1 and 2 never mutate anything, so a rejected cast has no side
//! effects at all.

use crate::ability::{
    AbilityDefinition, AbilityId, AbilityKind, AbilityOutcome, CostMode, EffectTarget, Payload,
    TargetingMode, formula,
};
use crate::combatant::ActionRequest;
use crate::config::EngineConfig;
use crate::kit::{KitTable, ScriptInvocation, ScriptTrigger};
use crate::state::CombatantId;
use crate::status::{EffectKind, EffectPulse, PulseTrigger, TickPayload};

use super::context::ActionContext;
use super::error::ResolveError;

// ============================================================================
// Cast
// ============================================================================

/// Casts `ability` for `ctx.actor` against `targets`.
///
/// Targets that are dead or gone are skipped; the cast fails with
/// [`ResolveError::NoValidTargets`] only if none remain. Returns one outcome
/// per damage, heal or shield actually delivered.
pub fn resolve(
    ctx: &mut ActionContext<'_>,
    ability: &AbilityId,
    targets: &[CombatantId],
) -> Result<Vec<AbilityOutcome>, ResolveError> {
    let actor = ctx.actor;
    let definition = validate(ctx, ability)?;

    let targets = resolve_targets(ctx, &definition, targets);
    if targets.is_empty() {
        return Err(ResolveError::NoValidTargets(ability.clone()));
    }

    // ===== commit =====
    let consumed = match &definition.cost {
        Some(cost) => ctx.consume_resource(&cost.resource, cost.amount),
        None => 0.0,
    };
    ctx.state.nonce += 1;
    if let Some(state) = ctx.state.combatant_mut(actor)
        && !state.cooldowns.take_free_cast(ability)
    {
        state.cooldowns.start(ability, definition.cooldown);
    }

    ctx.ui.show_ability_name(actor, &definition.name);
    if let Some(vfx) = &definition.vfx {
        for target in &targets {
            if definition.targeting.is_hostile() {
                ctx.ui.show_projectile(actor, *target, vfx);
            }
            ctx.ui.play_vfx(*target, vfx);
        }
    }

    let outcomes = apply_payloads(
        ctx,
        &definition.id,
        &definition.payloads,
        &targets,
        consumed,
        ScriptTrigger::Cast,
    );

    if !ctx.is_valid_target(actor) {
        tracing::debug!(%actor, %ability, "actor fell during its own cast");
        return Ok(outcomes);
    }

    if let Some(channel) = &definition.channel
        && let Some(state) = ctx.state.combatant_mut(actor)
    {
        state
            .channel
            .begin(definition.id.clone(), targets.clone(), channel.clone(), consumed);
    }

    let now = ctx.now();
    for delayed in &definition.delayed {
        ctx.state.timeline.schedule(
            now + delayed.delay.max(0.0),
            actor,
            definition.id.clone(),
            targets.clone(),
            delayed.payload.clone(),
            consumed,
        );
    }

    tracing::debug!(
        %actor,
        %ability,
        targets = targets.len(),
        outcomes = outcomes.len(),
        consumed,
        "ability resolved"
    );
    Ok(outcomes)
}

/// Looks up an ability for `actor`, falling back to the built-in basic attack.
pub fn ability_definition(
    kits: &KitTable,
    actor: CombatantId,
    ability: &AbilityId,
) -> Option<AbilityDefinition> {
    kits.get(&actor)
        .and_then(|kit| kit.parsed_ability(ability).cloned())
        .or_else(|| {
            (ability.as_str() == EngineConfig::BASIC_ATTACK)
                .then(AbilityDefinition::basic_attack)
        })
}

fn validate(
    ctx: &ActionContext<'_>,
    ability: &AbilityId,
) -> Result<AbilityDefinition, ResolveError> {
    let actor = ctx.actor;
    let state = ctx
        .state
        .combatant(actor)
        .ok_or(ResolveError::ActorNotFound(actor))?;

    if !state.is_active() || !ctx.arena.is_alive(actor) {
        return Err(ResolveError::ActorDead(actor));
    }
    if state.effects.has(&EffectKind::Stun) {
        return Err(ResolveError::Stunned(actor));
    }
    if state.channel.is_channeling() {
        return Err(ResolveError::ChannelInProgress(actor));
    }

    let definition = ability_definition(ctx.kits, actor, ability)
        .filter(AbilityDefinition::is_castable_kind)
        .ok_or_else(|| ResolveError::UnknownAbility(ability.clone()))?;

    if definition.kind != AbilityKind::Basic && state.effects.has(&EffectKind::Silence) {
        return Err(ResolveError::Silenced {
            actor,
            ability: ability.clone(),
        });
    }

    // A free follow-up may be cast mid-cooldown.
    if !state.cooldowns.has_free_cast(ability) && !state.cooldowns.is_ready(ability) {
        return Err(ResolveError::OnCooldown {
            ability: ability.clone(),
            remaining: state.cooldowns.remaining(ability),
        });
    }

    if let Some(cost) = &definition.cost
        && cost.mode == CostMode::Hard
    {
        let available = state.resources.get(&cost.resource);
        if available + f64::EPSILON < cost.amount {
            return Err(ResolveError::InsufficientResource {
                resource: cost.resource.clone(),
                required: cost.amount,
                available,
            });
        }
    }

    Ok(definition)
}

/// Filters requested targets down to valid ones (deduplicated, order kept).
///
/// Self-targeted abilities always hit the actor. Group abilities with no
/// explicit targets hit every valid enemy or ally.
fn resolve_targets(
    ctx: &ActionContext<'_>,
    definition: &AbilityDefinition,
    requested: &[CombatantId],
) -> Vec<CombatantId> {
    let actor = ctx.actor;
    let candidates: Vec<CombatantId> = match definition.targeting {
        TargetingMode::SelfOnly => vec![actor],
        TargetingMode::AllEnemies | TargetingMode::AllAllies if requested.is_empty() => {
            let hostile = definition.targeting == TargetingMode::AllEnemies;
            let Some(team) = ctx.arena.combatant(actor).map(|c| c.team()) else {
                return Vec::new();
            };
            ctx.arena
                .ids()
                .into_iter()
                .filter(|id| {
                    ctx.arena
                        .combatant(*id)
                        .is_some_and(|c| c.team().is_hostile_to(team) == hostile)
                })
                .collect()
        }
        _ => requested.to_vec(),
    };

    let mut targets = Vec::with_capacity(candidates.len());
    for id in candidates {
        if ctx.is_valid_target(id) && !targets.contains(&id) {
            targets.push(id);
        } else {
            tracing::debug!(%actor, target = %id, "dropping invalid target");
        }
    }
    targets
}

// ============================================================================
// Payload dispatch
// ============================================================================

/// Applies payloads in declaration order. Targets that die part-way are
/// skipped by later payloads without failing the rest.
pub fn apply_payloads(
    ctx: &mut ActionContext<'_>,
    ability: &AbilityId,
    payloads: &[Payload],
    targets: &[CombatantId],
    consumed: f64,
    trigger: ScriptTrigger,
) -> Vec<AbilityOutcome> {
    let mut outcomes = Vec::new();
    for payload in payloads {
        apply_payload(
            ctx,
            ability,
            payload,
            targets,
            consumed,
            trigger,
            &mut outcomes,
        );
    }
    outcomes
}

fn apply_payload(
    ctx: &mut ActionContext<'_>,
    ability: &AbilityId,
    payload: &Payload,
    targets: &[CombatantId],
    consumed: f64,
    trigger: ScriptTrigger,
    outcomes: &mut Vec<AbilityOutcome>,
) {
    let actor = ctx.actor;
    match payload {
        Payload::Damage { scaling, element } => {
            let stat = ctx.effective_stat(actor, scaling.stat);
            let amount = formula::magnitude(scaling, stat, consumed);
            for target in targets {
                outcomes.extend(ctx.deal_damage(*target, amount, *element));
            }
        }
        Payload::Heal { scaling } => {
            let stat = ctx.effective_stat(actor, scaling.stat);
            let amount = formula::magnitude(scaling, stat, consumed);
            for target in targets {
                outcomes.extend(ctx.heal(*target, amount));
            }
        }
        Payload::Shield { scaling, duration } => {
            let stat = ctx.effective_stat(actor, scaling.stat);
            let amount = formula::magnitude(scaling, stat, consumed);
            for target in targets {
                outcomes.extend(ctx.grant_shield(*target, amount, *duration));
            }
        }
        Payload::ApplyEffect { spec, on } => match on {
            EffectTarget::Target => {
                for target in targets {
                    ctx.apply_effect(*target, spec.clone());
                }
            }
            EffectTarget::Caster => {
                ctx.apply_effect(actor, spec.clone());
            }
        },
        Payload::GainResource {
            resource,
            amount,
            cap,
        } => {
            ctx.gain_resource(resource, *amount, *cap);
        }
        Payload::RefundCooldown { ability, seconds } => {
            ctx.refund_cooldown(ability, *seconds);
        }
        Payload::GrantFreeCast { ability } => {
            ctx.grant_free_cast(ability);
        }
        Payload::Cleanse => {
            for target in targets {
                ctx.cleanse(*target);
            }
        }
        Payload::Script { hook } => {
            let invocation = ScriptInvocation {
                hook: *hook,
                trigger,
                ability: Some(ability.clone()),
                targets: targets
                    .iter()
                    .copied()
                    .filter(|t| ctx.is_valid_target(*t))
                    .collect(),
                amount: consumed,
            };
            outcomes.extend(ctx.run_script(actor, &invocation));
        }
    }
}

/// Applies one effect pulse to its owner.
///
/// Periodic damage is attributed to the effect's source but carries no
/// accuracy, so it cannot be evaded. Resource gains go to the owner's own
/// ledger. Script pulses run in the source's kit.
pub fn apply_pulse(ctx: &mut ActionContext<'_>, pulse: &EffectPulse) -> Vec<AbilityOutcome> {
    let owner = pulse.owner;
    match &pulse.payload {
        TickPayload::Damage => ctx
            .hit(owner, ActionRequest::damage(pulse.source, pulse.amount))
            .into_iter()
            .collect(),
        TickPayload::Heal => ctx
            .hit(owner, ActionRequest::heal(pulse.source, pulse.amount))
            .into_iter()
            .collect(),
        TickPayload::GainResource { resource, cap } => {
            if let Some(state) = ctx.state.combatant_mut(owner)
                && state.is_active()
            {
                state.resources.add(resource, pulse.amount, *cap);
            }
            Vec::new()
        }
        // Scripts run in the source's kit, so a dead or retired source has
        // nothing left to run them. Plain damage and heal pulses still land.
        TickPayload::Script { .. } if !ctx.is_valid_target(pulse.source) => {
            tracing::debug!(source = %pulse.source, %owner, "dropping script from inactive source");
            Vec::new()
        }
        TickPayload::Script { hook } => {
            let trigger = match pulse.trigger {
                PulseTrigger::Interval => ScriptTrigger::EffectTick,
                PulseTrigger::Expiry => ScriptTrigger::EffectExpiry,
            };
            let invocation = ScriptInvocation {
                hook: *hook,
                trigger,
                ability: None,
                targets: vec![owner],
                amount: pulse.amount,
            };
            ctx.run_script(pulse.source, &invocation)
        }
    }
}
