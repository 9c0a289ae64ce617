//! Minimal combatant model used by the reference runner.
//!
//! Mitigation is a flat `100 / (100 + armor)` curve, where armor is
//! `Defense` for physical and untyped hits and `Resistance` for elemental
//! ones. Evasion and crits are rolled with the deterministic RNG, keyed by
//! the combatant's own roll counter.

use std::collections::BTreeMap;

use battle_core::rng::roll;
use battle_core::{
    ActionReceipt, ActionRequest, Arena, Combatant, CombatantId, Element, OutcomeKind, PcgRng,
    Position, RngOracle, StatKey, Team, compute_seed,
};

/// Damage multiplier on a critical hit.
pub const CRIT_MULTIPLIER: f64 = 1.5;

/// Upper bound on evade chance.
pub const MAX_EVADE_CHANCE: f64 = 0.75;

#[derive(Clone, Debug, PartialEq)]
pub struct SimCombatant {
    id: CombatantId,
    team: Team,
    position: Position,
    hp: f64,
    max_hp: f64,
    stats: BTreeMap<StatKey, f64>,
    seed: u64,
    rolls: u64,
}

impl SimCombatant {
    pub fn new(id: CombatantId, team: Team, max_hp: f64) -> Self {
        let max_hp = max_hp.max(0.0);
        Self {
            id,
            team,
            position: Position::default(),
            hp: max_hp,
            max_hp,
            stats: BTreeMap::new(),
            seed: 0,
            rolls: 0,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_stat(mut self, stat: StatKey, value: f64) -> Self {
        self.stats.insert(stat, value);
        self
    }

    /// Seed for this combatant's evade and crit rolls.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn set_hp(&mut self, hp: f64) {
        self.hp = hp.clamp(0.0, self.max_hp);
    }

    fn roll(&mut self, context: u32, probability: f64) -> bool {
        let seed = compute_seed(self.seed, self.rolls, self.id, context);
        self.rolls += 1;
        PcgRng.chance(seed, probability)
    }

    fn mitigate(&self, amount: f64, element: Option<Element>) -> f64 {
        let armor = match element {
            None | Some(Element::Physical) => self.stat(StatKey::Defense),
            Some(_) => self.stat(StatKey::Resistance),
        };
        amount * 100.0 / (100.0 + armor.max(0.0))
    }
}

impl Combatant for SimCombatant {
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
            StatKey::MaxHp => self.max_hp,
            _ => self.stats.get(&stat).copied().unwrap_or(0.0),
        }
    }

    fn receive_action(&mut self, request: &ActionRequest) -> ActionReceipt {
        let amount = request.amount.max(0.0);
        match request.kind {
            OutcomeKind::Damage => {
                if let Some(accuracy) = request.attacker_accuracy {
                    let evade = (self.stat(StatKey::Evasion) - accuracy)
                        .clamp(0.0, MAX_EVADE_CHANCE);
                    if self.roll(roll::EVADE, evade) {
                        return ActionReceipt {
                            was_evaded: true,
                            ..ActionReceipt::default()
                        };
                    }
                }
                let was_critical = request
                    .attacker_crit_chance
                    .is_some_and(|chance| self.roll(roll::CRIT, chance));
                let mut dealt = self.mitigate(amount, request.element);
                if was_critical {
                    dealt *= CRIT_MULTIPLIER;
                }
                let dealt = dealt.min(self.hp);
                self.hp -= dealt;
                ActionReceipt {
                    amount: dealt,
                    was_evaded: false,
                    was_critical,
                }
            }
            OutcomeKind::Heal => {
                let restored = amount.min(self.max_hp - self.hp).max(0.0);
                self.hp += restored;
                ActionReceipt {
                    amount: restored,
                    ..ActionReceipt::default()
                }
            }
            // Shields are tracked by the engine's effect registry.
            OutcomeKind::Shield => ActionReceipt::default(),
        }
    }
}

/// Combatants by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimArena {
    combatants: BTreeMap<CombatantId, SimCombatant>,
}

impl SimArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a combatant, returning `false` if the id is taken.
    pub fn insert(&mut self, combatant: SimCombatant) -> bool {
        if self.combatants.contains_key(&combatant.id) {
            return false;
        }
        self.combatants.insert(combatant.id, combatant);
        true
    }

    pub fn get(&self, id: CombatantId) -> Option<&SimCombatant> {
        self.combatants.get(&id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut SimCombatant> {
        self.combatants.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimCombatant> {
        self.combatants.values()
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Teams with at least one living combatant, ascending.
    pub fn living_teams(&self) -> Vec<Team> {
        let mut teams: Vec<Team> = self
            .combatants
            .values()
            .filter(|c| c.is_alive())
            .map(|c| c.team)
            .collect();
        teams.sort();
        teams.dedup();
        teams
    }
}

impl Arena for SimArena {
    fn combatant(&self, id: CombatantId) -> Option<&dyn Combatant> {
        self.combatants.get(&id).map(|c| c as &dyn Combatant)
    }

    fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut dyn Combatant> {
        self.combatants.get_mut(&id).map(|c| c as &mut dyn Combatant)
    }

    fn ids(&self) -> Vec<CombatantId> {
        self.combatants.keys().copied().collect()
    }
}
