#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use battle_core::{
    AbilityDefinition, AbilityKit, AbilityOutcome, ActionContext, ActionReceipt, ActionRequest,
    Arena, BattleEngine, Combatant, CombatantId, EngineConfig, OutcomeKind, PassiveContext,
    Position, ResourceDeclaration, ScriptInvocation, StatKey, Team,
};

pub const HERO: CombatantId = CombatantId(1);
pub const ALLY: CombatantId = CombatantId(2);
pub const FOE_A: CombatantId = CombatantId(10);
pub const FOE_B: CombatantId = CombatantId(11);

/// Minimal combatant: flat mitigation-free HP pool.
#[derive(Clone, Debug)]
pub struct Dummy {
    pub id: CombatantId,
    pub team: Team,
    pub position: Position,
    pub hp: f64,
    pub max_hp: f64,
    pub attack: f64,
    /// Evades every request that carries attacker accuracy.
    pub evade_all: bool,
    pub received: Vec<ActionRequest>,
}

impl Dummy {
    pub fn new(id: CombatantId, team: u8, x: f64) -> Self {
        Self {
            id,
            team: Team(team),
            position: Position::new(x, 0.0),
            hp: 100.0,
            max_hp: 100.0,
            attack: 10.0,
            evade_all: false,
            received: Vec::new(),
        }
    }
}

impl Combatant for Dummy {
    fn id(&self) -> CombatantId {
        self.id
    }

    fn team(&self) -> Team {
        self.team
    }

    fn position(&self) -> Position {
        self.position
    }

    fn hp(&self) -> f64 {
        self.hp
    }

    fn max_hp(&self) -> f64 {
        self.max_hp
    }

    fn stat(&self, stat: StatKey) -> f64 {
        match stat {
            StatKey::Attack | StatKey::Magic => self.attack,
            StatKey::MaxHp => self.max_hp,
            _ => 0.0,
        }
    }

    fn receive_action(&mut self, request: &ActionRequest) -> ActionReceipt {
        self.received.push(request.clone());
        match request.kind {
            OutcomeKind::Damage => {
                if self.evade_all && request.attacker_accuracy.is_some() {
                    return ActionReceipt {
                        amount: 0.0,
                        was_evaded: true,
                        was_critical: false,
                    };
                }
                let dealt = request.amount.min(self.hp);
                self.hp -= dealt;
                ActionReceipt {
                    amount: dealt,
                    ..ActionReceipt::default()
                }
            }
            OutcomeKind::Heal => {
                let restored = request.amount.min(self.max_hp - self.hp);
                self.hp += restored;
                ActionReceipt {
                    amount: restored,
                    ..ActionReceipt::default()
                }
            }
            OutcomeKind::Shield => ActionReceipt::default(),
        }
    }
}

#[derive(Default)]
pub struct TestArena {
    pub combatants: BTreeMap<CombatantId, Dummy>,
}

impl TestArena {
    pub fn with(dummies: impl IntoIterator<Item = Dummy>) -> Self {
        Self {
            combatants: dummies.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    pub fn hp(&self, id: CombatantId) -> f64 {
        self.combatants[&id].hp
    }

    pub fn get_mut(&mut self, id: CombatantId) -> &mut Dummy {
        self.combatants.get_mut(&id).expect("combatant in arena")
    }
}

impl Arena for TestArena {
    fn combatant(&self, id: CombatantId) -> Option<&dyn Combatant> {
        self.combatants.get(&id).map(|c| c as &dyn Combatant)
    }

    fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut dyn Combatant> {
        self.combatants
            .get_mut(&id)
            .map(|c| c as &mut dyn Combatant)
    }

    fn ids(&self) -> Vec<CombatantId> {
        self.combatants.keys().copied().collect()
    }
}

/// Data-only kit with optional passive resource trickle and a script hook
/// that grants one "combo" per invocation.
#[derive(Default)]
pub struct TestKit {
    pub abilities: Vec<AbilityDefinition>,
    pub resources: Vec<ResourceDeclaration>,
    pub trickle: Option<(String, f64)>,
}

impl AbilityKit for TestKit {
    fn name(&self) -> &str {
        "test"
    }

    fn abilities(&self) -> &[AbilityDefinition] {
        &self.abilities
    }

    fn resources(&self) -> &[ResourceDeclaration] {
        &self.resources
    }

    fn update_passives(&self, ctx: &mut PassiveContext<'_>) {
        if let Some((resource, per_second)) = &self.trickle {
            ctx.me.resources.gain(resource, per_second * ctx.dt);
        }
    }

    fn on_script(
        &self,
        invocation: &ScriptInvocation,
        ctx: &mut ActionContext<'_>,
    ) -> Vec<AbilityOutcome> {
        ctx.gain_resource("combo", 1.0, 5.0);
        invocation
            .targets
            .iter()
            .filter_map(|t| ctx.deal_damage(*t, f64::from(invocation.hook), None))
            .collect()
    }
}

pub fn kit(abilities: Vec<AbilityDefinition>) -> TestKit {
    TestKit {
        abilities,
        ..TestKit::default()
    }
}

/// Hero (team 0) at x=0, ally at x=1, two foes (team 1) at x=5 and x=6.
pub fn setup(hero: TestKit) -> (BattleEngine, TestArena) {
    let mut engine = BattleEngine::new(EngineConfig::default(), 7);
    engine.register(HERO, Arc::new(hero));
    engine.register(ALLY, Arc::new(TestKit::default()));
    engine.register(FOE_A, Arc::new(TestKit::default()));
    engine.register(FOE_B, Arc::new(TestKit::default()));

    let arena = TestArena::with([
        Dummy::new(HERO, 0, 0.0),
        Dummy::new(ALLY, 0, 1.0),
        Dummy::new(FOE_A, 1, 5.0),
        Dummy::new(FOE_B, 1, 6.0),
    ]);
    (engine, arena)
}
