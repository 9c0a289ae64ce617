mod common;

use battle_core::{
    AbilityDefinition, AbilityId, AbilityKind, ChannelPhase, ChannelSpec, CostMode, Decision,
    EffectKind, EffectTarget, EngineError, NullPresenter, OutcomeKind, Payload, ResolveError,
    ResourceDeclaration, Scaling, StatKey, TargetingMode, TickPayload, TimedEffectSpec,
};
use common::{ALLY, FOE_A, FOE_B, HERO, TestKit, kit, setup};

fn cast(ability: &str, targets: Vec<battle_core::CombatantId>) -> Decision {
    Decision {
        ability: AbilityId::from(ability),
        targets,
        kind: AbilityKind::Skill,
    }
}

fn strike(ratio: f64) -> Payload {
    Payload::Damage {
        scaling: Scaling::new(StatKey::Attack, ratio),
        element: None,
    }
}

#[test]
fn hard_cost_failure_has_no_side_effects() {
    let nuke = AbilityDefinition::new("nuke", AbilityKind::Skill)
        .with_cost("rage", 50.0, CostMode::Hard)
        .with_cooldown(5.0)
        .with_payload(strike(3.0));
    let (mut engine, mut arena) = setup(TestKit {
        resources: vec![ResourceDeclaration::new("rage", 100.0).with_initial(30.0)],
        ..kit(vec![nuke])
    });
    let nonce = engine.state().nonce;

    let err = engine
        .execute(HERO, &cast("nuke", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap_err();

    assert!(matches!(err, ResolveError::InsufficientResource { .. }));
    assert_eq!(err.error_code(), "RESOLVE_INSUFFICIENT_RESOURCE");
    let hero = engine.state().combatant(HERO).unwrap();
    assert_eq!(hero.resources.get("rage"), 30.0);
    assert!(hero.cooldowns.is_ready(&AbilityId::from("nuke")));
    assert_eq!(engine.state().nonce, nonce);
    assert_eq!(arena.hp(FOE_A), 100.0);
}

#[test]
fn partial_cost_scales_with_what_was_consumed() {
    let dump = AbilityDefinition::new("dump", AbilityKind::Skill)
        .with_cost("rage", 50.0, CostMode::Partial)
        .with_payload(Payload::Damage {
            scaling: Scaling::flat(0.0).per_consumed(2.0),
            element: None,
        });
    let (mut engine, mut arena) = setup(TestKit {
        resources: vec![ResourceDeclaration::new("rage", 100.0).with_initial(30.0)],
        ..kit(vec![dump])
    });

    let outcomes = engine
        .execute(HERO, &cast("dump", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].amount(), 60.0);
    assert_eq!(arena.hp(FOE_A), 40.0);
    assert_eq!(engine.state().combatant(HERO).unwrap().resources.get("rage"), 0.0);
}

#[test]
fn shields_absorb_before_hp() {
    let (mut engine, mut arena) = setup(kit(vec![
        AbilityDefinition::new("hit", AbilityKind::Skill).with_payload(strike(5.0)),
    ]));
    engine.apply_status(FOE_A, TimedEffectSpec::new(EffectKind::Shield, 30.0, 10.0));

    let outcomes = engine
        .execute(HERO, &cast("hit", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();

    assert_eq!(outcomes[0].amount(), 50.0);
    assert_eq!(arena.hp(FOE_A), 80.0);
    let foe = engine.state().combatant(FOE_A).unwrap();
    assert!(!foe.effects.has(&EffectKind::Shield));
}

#[test]
fn fully_absorbed_hit_never_reaches_the_combatant() {
    let (mut engine, mut arena) = setup(kit(vec![
        AbilityDefinition::new("hit", AbilityKind::Skill).with_payload(strike(1.0)),
    ]));
    arena.get_mut(FOE_A).evade_all = true;
    engine.apply_status(FOE_A, TimedEffectSpec::new(EffectKind::Shield, 100.0, 10.0));

    let outcomes = engine
        .execute(HERO, &cast("hit", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();

    assert!(!outcomes[0].was_evaded());
    assert_eq!(outcomes[0].amount(), 10.0);
    assert!(arena.combatants[&FOE_A].received.is_empty());
    assert_eq!(engine.state().combatant(FOE_A).unwrap().effects.shield_total(), 90.0);
}

#[test]
fn evaded_hit_leaves_shields_intact() {
    let (mut engine, mut arena) = setup(kit(vec![
        AbilityDefinition::new("hit", AbilityKind::Skill).with_payload(strike(5.0)),
    ]));
    arena.get_mut(FOE_A).evade_all = true;
    engine.apply_status(FOE_A, TimedEffectSpec::new(EffectKind::Shield, 30.0, 10.0));

    let outcomes = engine
        .execute(HERO, &cast("hit", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();

    assert!(outcomes[0].was_evaded());
    assert_eq!(outcomes[0].amount(), 0.0);
    assert_eq!(arena.hp(FOE_A), 100.0);
    assert_eq!(arena.combatants[&FOE_A].received.len(), 1);
    assert_eq!(engine.state().combatant(FOE_A).unwrap().effects.shield_total(), 30.0);
}

#[test]
fn shield_payload_records_absorption_effect() {
    let ward = AbilityDefinition::new("ward", AbilityKind::Support)
        .with_targeting(TargetingMode::Ally(Default::default()))
        .with_payload(Payload::Shield {
            scaling: Scaling::new(StatKey::Magic, 2.0),
            duration: 4.0,
        });
    let (mut engine, mut arena) = setup(kit(vec![ward]));

    let outcomes = engine
        .execute(HERO, &cast("ward", vec![ALLY]), &mut arena, &mut NullPresenter)
        .unwrap();

    assert_eq!(outcomes[0].kind(), OutcomeKind::Shield);
    assert_eq!(outcomes[0].amount(), 20.0);
    assert_eq!(engine.state().combatant(ALLY).unwrap().effects.shield_total(), 20.0);
}

#[test]
fn free_cast_skips_cooldown_once() {
    let big = AbilityDefinition::new("big", AbilityKind::Skill)
        .with_cooldown(10.0)
        .with_payload(strike(1.0));
    let (mut engine, mut arena) = setup(kit(vec![big]));
    let id = AbilityId::from("big");
    engine
        .state_mut()
        .combatant_mut(HERO)
        .unwrap()
        .cooldowns
        .grant_free_cast(&id);

    engine
        .execute(HERO, &cast("big", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();
    assert!(engine.state().combatant(HERO).unwrap().cooldowns.is_ready(&id));

    engine
        .execute(HERO, &cast("big", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();
    let err = engine
        .execute(HERO, &cast("big", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap_err();
    assert!(matches!(err, ResolveError::OnCooldown { .. }));
}

#[test]
fn free_cast_goes_through_a_running_cooldown() {
    let big = AbilityDefinition::new("big", AbilityKind::Skill)
        .with_cooldown(10.0)
        .with_payload(strike(1.0));
    let (mut engine, mut arena) = setup(kit(vec![big]));
    let id = AbilityId::from("big");

    engine
        .execute(HERO, &cast("big", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();
    engine
        .state_mut()
        .combatant_mut(HERO)
        .unwrap()
        .cooldowns
        .grant_free_cast(&id);
    engine
        .execute(HERO, &cast("big", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();

    assert_eq!(arena.hp(FOE_A), 80.0);
    let cooldowns = &engine.state().combatant(HERO).unwrap().cooldowns;
    assert!(!cooldowns.has_free_cast(&id));
    assert_eq!(cooldowns.remaining(&id), 10.0);
}

#[test]
fn dead_targets_are_skipped_without_failing_the_cast() {
    let sweep = AbilityDefinition::new("sweep", AbilityKind::Skill)
        .with_targeting(TargetingMode::AllEnemies)
        .with_payload(strike(1.0));
    let (mut engine, mut arena) = setup(kit(vec![sweep]));
    arena.get_mut(FOE_A).hp = 0.0;

    let outcomes = engine
        .execute(HERO, &cast("sweep", vec![FOE_A, FOE_B]), &mut arena, &mut NullPresenter)
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].target(), FOE_B);

    arena.get_mut(FOE_B).hp = 0.0;
    let err = engine
        .execute(HERO, &cast("sweep", vec![FOE_A, FOE_B]), &mut arena, &mut NullPresenter)
        .unwrap_err();
    assert!(matches!(err, ResolveError::NoValidTargets(_)));
}

#[test]
fn group_targeting_fills_in_targets() {
    let nova = AbilityDefinition::new("nova", AbilityKind::Skill)
        .with_targeting(TargetingMode::AllEnemies)
        .with_payload(strike(1.0));
    let (mut engine, mut arena) = setup(kit(vec![nova]));

    let outcomes = engine
        .execute(HERO, &cast("nova", vec![]), &mut arena, &mut NullPresenter)
        .unwrap();

    let mut hit: Vec<_> = outcomes.iter().map(|o| o.target()).collect();
    hit.sort();
    assert_eq!(hit, vec![FOE_A, FOE_B]);
    assert_eq!(arena.hp(ALLY), 100.0);
}

#[test]
fn stun_and_silence_gate_casts() {
    let skill = AbilityDefinition::new("skill", AbilityKind::Skill).with_payload(strike(1.0));
    let (mut engine, mut arena) = setup(kit(vec![skill]));

    engine.apply_status(HERO, TimedEffectSpec::new(EffectKind::Silence, 0.0, 2.0));
    let err = engine
        .execute(HERO, &cast("skill", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap_err();
    assert!(matches!(err, ResolveError::Silenced { .. }));
    engine
        .execute(
            HERO,
            &Decision::basic_attack(vec![FOE_A]),
            &mut arena,
            &mut NullPresenter,
        )
        .unwrap();

    engine.apply_status(HERO, TimedEffectSpec::new(EffectKind::Stun, 0.0, 1.0));
    let err = engine.act(HERO, &mut arena, &mut NullPresenter).unwrap_err();
    assert_eq!(err, ResolveError::Stunned(HERO));

    engine.advance(2.5, &mut arena, &mut NullPresenter);
    let report = engine.act(HERO, &mut arena, &mut NullPresenter).unwrap();
    assert_eq!(report.decision.ability.as_str(), "skill");
}

#[test]
fn resource_payloads_stay_with_the_caster() {
    let rally = AbilityDefinition::new("rally", AbilityKind::Skill)
        .with_payload(strike(1.0))
        .with_payload(Payload::GainResource {
            resource: "rage".into(),
            amount: 15.0,
            cap: 20.0,
        });
    let (mut engine, mut arena) = setup(kit(vec![rally]));

    engine
        .execute(HERO, &cast("rally", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();
    engine
        .execute(HERO, &cast("rally", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();

    assert_eq!(engine.state().combatant(HERO).unwrap().resources.get("rage"), 20.0);
    assert_eq!(engine.state().combatant(FOE_A).unwrap().resources.get("rage"), 0.0);
}

#[test]
fn caster_effects_land_on_the_caster() {
    let frenzy = AbilityDefinition::new("frenzy", AbilityKind::Skill)
        .with_payload(strike(1.0))
        .with_payload(Payload::ApplyEffect {
            spec: TimedEffectSpec::new(EffectKind::StatModifier(StatKey::Attack), 0.5, 5.0),
            on: EffectTarget::Caster,
        });
    let (mut engine, mut arena) = setup(kit(vec![frenzy]));

    engine
        .execute(HERO, &cast("frenzy", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();
    let outcomes = engine
        .execute(HERO, &cast("frenzy", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();

    assert_eq!(outcomes[0].amount(), 15.0);
    assert_eq!(arena.hp(FOE_A), 75.0);
}

#[test]
fn script_hooks_run_in_the_casters_kit() {
    let combo = AbilityDefinition::new("combo", AbilityKind::Skill)
        .with_payload(Payload::Script { hook: 7 });
    let (mut engine, mut arena) = setup(kit(vec![combo]));

    let outcomes = engine
        .execute(HERO, &cast("combo", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(arena.hp(FOE_A), 93.0);
    assert_eq!(engine.state().combatant(HERO).unwrap().resources.get("combo"), 1.0);
}

#[test]
fn damage_over_time_ticks_through_the_engine() {
    let (mut engine, mut arena) = setup(kit(vec![]));
    let burn = TimedEffectSpec::new(EffectKind::DamageOverTime, 10.0, 3.0)
        .ticking(1.0, TickPayload::Damage);
    engine.apply_status(FOE_A, burn);

    let summary = engine.advance(3.0, &mut arena, &mut NullPresenter);

    assert_eq!(summary.outcomes.len(), 3);
    assert_eq!(arena.hp(FOE_A), 70.0);
    assert_eq!(summary.expired, vec![(FOE_A, EffectKind::DamageOverTime)]);
}

#[test]
fn delayed_payload_follows_the_simulated_clock() {
    let bomb = AbilityDefinition::new("bomb", AbilityKind::Skill).with_delayed(2.0, strike(4.0));
    let (mut engine, mut arena) = setup(kit(vec![bomb]));

    engine
        .execute(HERO, &cast("bomb", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();
    assert_eq!(arena.hp(FOE_A), 100.0);
    assert_eq!(engine.state().timeline.len(), 1);

    engine.pause();
    engine.advance(5.0, &mut arena, &mut NullPresenter);
    assert_eq!(arena.hp(FOE_A), 100.0);

    engine.resume();
    engine.set_speed_multiplier(2.0);
    engine.advance(0.5, &mut arena, &mut NullPresenter);
    assert_eq!(arena.hp(FOE_A), 100.0);
    engine.advance(0.5, &mut arena, &mut NullPresenter);
    assert_eq!(arena.hp(FOE_A), 60.0);
    assert!(engine.state().timeline.is_empty());
}

#[test]
fn delayed_payload_is_dropped_when_the_caster_dies() {
    let bomb = AbilityDefinition::new("bomb", AbilityKind::Skill).with_delayed(1.0, strike(4.0));
    let (mut engine, mut arena) = setup(kit(vec![bomb]));

    engine
        .execute(HERO, &cast("bomb", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();
    arena.get_mut(HERO).hp = 0.0;
    let summary = engine.advance(2.0, &mut arena, &mut NullPresenter);

    assert_eq!(summary.retired, vec![HERO]);
    assert_eq!(arena.hp(FOE_A), 100.0);
}

fn beam() -> AbilityDefinition {
    AbilityDefinition::new("beam", AbilityKind::Skill)
        .with_cost("mana", 40.0, CostMode::Hard)
        .with_channel(ChannelSpec {
            windup: 1.0,
            duration: 2.0,
            pulse_interval: Some(1.0),
            pulse: vec![strike(1.0)],
            resolution: vec![strike(3.0)],
        })
}

#[test]
fn channel_pulses_then_resolves() {
    let (mut engine, mut arena) = setup(TestKit {
        resources: vec![ResourceDeclaration::new("mana", 100.0).with_initial(100.0)],
        ..kit(vec![beam()])
    });

    engine
        .execute(HERO, &cast("beam", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();
    let channel = &engine.state().combatant(HERO).unwrap().channel;
    assert_eq!(channel.phase(), ChannelPhase::Windup);

    let err = engine
        .execute(HERO, &cast("beam", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap_err();
    assert_eq!(err, ResolveError::ChannelInProgress(HERO));

    engine.advance(1.0, &mut arena, &mut NullPresenter);
    assert_eq!(arena.hp(FOE_A), 100.0);
    engine.advance(1.0, &mut arena, &mut NullPresenter);
    assert_eq!(arena.hp(FOE_A), 90.0);
    engine.advance(1.0, &mut arena, &mut NullPresenter);
    assert_eq!(arena.hp(FOE_A), 50.0);

    let hero = engine.state().combatant(HERO).unwrap();
    assert_eq!(hero.channel.phase(), ChannelPhase::Idle);
    assert_eq!(hero.resources.get("mana"), 60.0);
}

#[test]
fn channel_cancelled_by_death_skips_resolution_without_refund() {
    let (mut engine, mut arena) = setup(TestKit {
        resources: vec![ResourceDeclaration::new("mana", 100.0).with_initial(100.0)],
        ..kit(vec![beam()])
    });

    engine
        .execute(HERO, &cast("beam", vec![FOE_A]), &mut arena, &mut NullPresenter)
        .unwrap();
    engine.advance(2.0, &mut arena, &mut NullPresenter);
    assert_eq!(arena.hp(FOE_A), 90.0);

    arena.get_mut(HERO).hp = 0.0;
    engine.advance(5.0, &mut arena, &mut NullPresenter);

    assert_eq!(arena.hp(FOE_A), 90.0);
    let hero = engine.state().combatant(HERO).unwrap();
    assert!(hero.removed);
    assert!(!hero.channel.is_channeling());
    assert_eq!(hero.resources.get("mana"), 60.0);
}

#[test]
fn passives_run_every_tick() {
    let (mut engine, mut arena) = setup(TestKit {
        resources: vec![ResourceDeclaration::new("focus", 10.0)],
        trickle: Some(("focus".into(), 2.0)),
        ..kit(vec![])
    });

    for _ in 0..4 {
        engine.advance(1.0, &mut arena, &mut NullPresenter);
    }
    assert_eq!(engine.state().combatant(HERO).unwrap().resources.get("focus"), 8.0);

    engine.advance(5.0, &mut arena, &mut NullPresenter);
    assert_eq!(engine.state().combatant(HERO).unwrap().resources.get("focus"), 10.0);
}

#[test]
fn effects_on_removed_combatants_are_ignored() {
    let (mut engine, _arena) = setup(kit(vec![]));
    assert!(engine.remove(FOE_B));

    let handle = engine.apply_status(FOE_B, TimedEffectSpec::new(EffectKind::Stun, 0.0, 2.0));
    assert_eq!(handle, None);
    assert!(engine.state().combatant(FOE_B).unwrap().effects.is_empty());
}
