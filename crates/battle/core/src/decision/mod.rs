//! Decision Heuristic.
//!
//! Maps `(actor, enemies, allies)` to an ability and a target set. Abilities
//! are considered in a fixed priority order:
//!
//! 1. Ultimates, when ready and their situational condition holds
//! 2. Support and control abilities
//! 3. Primary damage skills
//! 4. Basic attack, which is always available
//!
//! Within a tier, kit declaration order wins. The heuristic only reads engine
//! state; it never mutates it.

pub mod targeting;

use crate::ability::{
    AbilityDefinition, AbilityId, AbilityKind, CostMode, TargetingMode, UseCondition,
};
use crate::combatant::CombatantView;
use crate::rng::{self, RngOracle, compute_seed};
use crate::state::{BattleState, CombatantId, CombatantState};
use crate::status::EffectKind;

/// Inputs to a decision, passed explicitly.
pub struct DecisionContext<'a> {
    pub actor: CombatantView,
    /// Living hostile combatants.
    pub enemies: &'a [CombatantView],
    /// Living friendly combatants, including the actor.
    pub allies: &'a [CombatantView],
    pub state: &'a BattleState,
    pub rng: &'a dyn RngOracle,
}

impl<'a> DecisionContext<'a> {
    pub fn me(&self) -> Option<&'a CombatantState> {
        self.state.combatant(self.actor.id)
    }

    /// Seed for random target picks of the next cast.
    pub fn seed(&self) -> u64 {
        compute_seed(
            self.state.seed,
            self.state.nonce,
            self.actor.id,
            rng::roll::TARGET,
        )
    }

    fn is_live(&self, view: &CombatantView) -> bool {
        view.alive
            && self
                .state
                .combatant(view.id)
                .is_some_and(CombatantState::is_active)
    }

    fn live_enemies(&self) -> Vec<CombatantView> {
        self.enemies
            .iter()
            .filter(|v| self.is_live(v))
            .copied()
            .collect()
    }

    fn live_allies(&self) -> Vec<CombatantView> {
        self.allies
            .iter()
            .filter(|v| self.is_live(v))
            .copied()
            .collect()
    }

    /// Source of a taunt on the actor, if that source is still a live enemy.
    fn taunted_by(&self) -> Option<CombatantId> {
        let taunt = self.me()?.effects.query(&EffectKind::Taunt)?;
        self.enemies
            .iter()
            .find(|e| e.id == taunt.source && self.is_live(e))
            .map(|e| e.id)
    }
}

/// The chosen action.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decision {
    pub ability: AbilityId,
    pub targets: Vec<CombatantId>,
    pub kind: AbilityKind,
}

impl Decision {
    pub fn basic_attack(targets: Vec<CombatantId>) -> Self {
        Self {
            ability: AbilityId::basic_attack(),
            targets,
            kind: AbilityKind::Basic,
        }
    }
}

/// Picks the highest-priority usable ability and its targets.
///
/// Never fails: when nothing else qualifies the built-in basic attack is
/// returned (with no targets if no enemy is alive).
pub fn decide(abilities: &[AbilityDefinition], ctx: &DecisionContext<'_>) -> Decision {
    let Some(me) = ctx.me() else {
        return Decision::basic_attack(Vec::new());
    };
    let silenced = me.effects.has(&EffectKind::Silence);
    let taunter = ctx.taunted_by();

    let mut candidates: Vec<&AbilityDefinition> = abilities
        .iter()
        .filter(|a| a.is_castable_kind())
        .collect();
    candidates.sort_by_key(|a| a.kind.tier());

    for ability in candidates {
        if silenced && ability.kind != AbilityKind::Basic {
            continue;
        }
        if !is_ready(me, ability) {
            continue;
        }
        let Some(targets) = select_targets(&ability.targeting, ctx, taunter) else {
            continue;
        };
        if !condition_holds(&ability.condition, ctx, me, &targets) {
            continue;
        }

        tracing::trace!(
            actor = %ctx.actor.id,
            ability = %ability.id,
            kind = %ability.kind,
            targets = targets.len(),
            "decision"
        );
        return Decision {
            ability: ability.id.clone(),
            targets,
            kind: ability.kind,
        };
    }

    let targets = select_targets(&TargetingMode::default(), ctx, taunter).unwrap_or_default();
    Decision::basic_attack(targets)
}

fn is_ready(me: &CombatantState, ability: &AbilityDefinition) -> bool {
    let off_cooldown =
        me.cooldowns.has_free_cast(&ability.id) || me.cooldowns.is_ready(&ability.id);
    let affordable = match &ability.cost {
        Some(cost) if cost.mode == CostMode::Hard => {
            me.resources.get(&cost.resource) + f64::EPSILON >= cost.amount
        }
        _ => true,
    };
    off_cooldown && affordable
}

/// Targets for `mode`, or `None` when there is nobody to hit.
///
/// A taunted actor aims single-target hostile abilities at the taunter.
pub fn select_targets(
    mode: &TargetingMode,
    ctx: &DecisionContext<'_>,
    taunter: Option<CombatantId>,
) -> Option<Vec<CombatantId>> {
    let origin = &ctx.actor;
    let targets = match mode {
        TargetingMode::SelfOnly => vec![origin.id],
        TargetingMode::Enemy(rule) => match taunter {
            Some(taunter) => vec![taunter],
            None => targeting::pick(*rule, origin, &ctx.live_enemies(), ctx.rng, ctx.seed())
                .into_iter()
                .collect(),
        },
        TargetingMode::Ally(rule) => {
            targeting::pick(*rule, origin, &ctx.live_allies(), ctx.rng, ctx.seed())
                .into_iter()
                .collect()
        }
        TargetingMode::AllEnemies => ctx.live_enemies().iter().map(|v| v.id).collect(),
        TargetingMode::AllAllies => ctx.live_allies().iter().map(|v| v.id).collect(),
        TargetingMode::EnemyCluster { radius } => {
            targeting::densest_cluster(origin, &ctx.live_enemies(), *radius)
        }
    };
    (!targets.is_empty()).then_some(targets)
}

fn condition_holds(
    condition: &UseCondition,
    ctx: &DecisionContext<'_>,
    me: &CombatantState,
    targets: &[CombatantId],
) -> bool {
    match condition {
        UseCondition::Always => true,
        UseCondition::EnemiesClustered { count, radius } => {
            let enemies = ctx.live_enemies();
            enemies
                .iter()
                .map(|e| targeting::cluster_size(e, &enemies, *radius))
                .max()
                .is_some_and(|size| size >= *count)
        }
        UseCondition::AllyHpBelow(threshold) => ctx
            .live_allies()
            .iter()
            .any(|a| a.hp_fraction() < *threshold),
        UseCondition::SelfHpBelow(threshold) => ctx.actor.hp_fraction() < *threshold,
        UseCondition::ResourceAtLeast { resource, amount } => {
            me.resources.get(resource) + f64::EPSILON >= *amount
        }
        UseCondition::TargetLacks(kind) => targets.first().is_some_and(|target| {
            ctx.state
                .combatant(*target)
                .is_some_and(|s| !s.effects.has(kind))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{Payload, Scaling};
    use crate::combatant::StatKey;
    use crate::config::EngineConfig;
    use crate::rng::PcgRng;
    use crate::state::{Position, Team};
    use crate::status::TimedEffectSpec;

    fn view(id: u32, team: u8, hp: f64, x: f64) -> CombatantView {
        CombatantView {
            id: CombatantId(id),
            team: Team(team),
            position: Position::new(x, 0.0),
            hp,
            max_hp: 100.0,
            alive: hp > 0.0,
        }
    }

    fn battle(ids: &[u32]) -> BattleState {
        let config = EngineConfig::default();
        let mut state = BattleState::new(&config, 42);
        for id in ids {
            state
                .combatants
                .insert(CombatantId(*id), CombatantState::new(&config));
        }
        state
    }

    fn kit() -> Vec<AbilityDefinition> {
        vec![
            AbilityDefinition::new("strike", AbilityKind::Skill)
                .with_cooldown(4.0)
                .with_payload(Payload::Damage {
                    scaling: Scaling::new(StatKey::Attack, 2.0),
                    element: None,
                }),
            AbilityDefinition::new("meteor", AbilityKind::Ultimate)
                .with_cost("rage", 100.0, CostMode::Hard)
                .with_targeting(TargetingMode::EnemyCluster { radius: 2.0 })
                .with_condition(UseCondition::EnemiesClustered {
                    count: 2,
                    radius: 2.0,
                }),
            AbilityDefinition::basic_attack(),
        ]
    }

    struct Fixture {
        state: BattleState,
        me: CombatantView,
        allies: Vec<CombatantView>,
        enemies: Vec<CombatantView>,
    }

    impl Fixture {
        fn new() -> Self {
            let me = view(1, 0, 100.0, 0.0);
            Self {
                state: battle(&[1, 10, 11, 12]),
                me,
                allies: vec![me],
                enemies: vec![
                    view(10, 1, 80.0, 5.0),
                    view(11, 1, 30.0, 6.0),
                    view(12, 1, 90.0, 20.0),
                ],
            }
        }

        fn decide(&self) -> Decision {
            let ctx = DecisionContext {
                actor: self.me,
                enemies: &self.enemies,
                allies: &self.allies,
                state: &self.state,
                rng: &PcgRng,
            };
            decide(&kit(), &ctx)
        }

        fn me_mut(&mut self) -> &mut CombatantState {
            self.state
                .combatant_mut(CombatantId(1))
                .expect("actor registered")
        }
    }

    #[test]
    fn prefers_skill_over_basic_and_targets_lowest_hp() {
        let fixture = Fixture::new();
        let decision = fixture.decide();
        assert_eq!(decision.ability.as_str(), "strike");
        assert_eq!(decision.targets, vec![CombatantId(11)]);
    }

    #[test]
    fn ultimate_needs_resource_and_cluster() {
        let mut fixture = Fixture::new();
        fixture.me_mut().resources.add("rage", 100.0, 100.0);

        let decision = fixture.decide();
        assert_eq!(decision.kind, AbilityKind::Ultimate);
        assert_eq!(decision.targets.len(), 2);

        fixture.enemies[1].position = Position::new(50.0, 0.0);
        assert_eq!(fixture.decide().ability.as_str(), "strike");
    }

    #[test]
    fn falls_back_to_basic_attack_on_cooldown() {
        let mut fixture = Fixture::new();
        fixture.me_mut().cooldowns.start(&AbilityId::from("strike"), 4.0);

        let decision = fixture.decide();
        assert_eq!(decision.ability, AbilityId::basic_attack());
        assert_eq!(decision.targets, vec![CombatantId(11)]);
    }

    #[test]
    fn silence_allows_only_basic_attack() {
        let mut fixture = Fixture::new();
        fixture
            .me_mut()
            .effects
            .apply(TimedEffectSpec::new(EffectKind::Silence, 0.0, 3.0));

        assert_eq!(fixture.decide().kind, AbilityKind::Basic);
    }

    #[test]
    fn taunt_redirects_single_target_abilities() {
        let mut fixture = Fixture::new();
        fixture.me_mut().effects.apply(
            TimedEffectSpec::new(EffectKind::Taunt, 0.0, 3.0).from_source(CombatantId(12)),
        );

        assert_eq!(fixture.decide().targets, vec![CombatantId(12)]);
    }

    #[test]
    fn dead_enemies_are_never_targeted() {
        let mut fixture = Fixture::new();
        fixture.enemies[1].hp = 0.0;
        fixture.enemies[1].alive = false;

        assert_eq!(fixture.decide().targets, vec![CombatantId(10)]);
    }

    #[test]
    fn no_enemies_still_yields_a_decision() {
        let mut fixture = Fixture::new();
        fixture.enemies.clear();

        let decision = fixture.decide();
        assert_eq!(decision, Decision::basic_attack(Vec::new()));
    }
}
