//! Collaborator interfaces the engine calls into.
//!
//! The combatant data model (HP, base stats, mitigation) and presentation are
//! owned by the host battle engine. The core only talks to them through the
//! [`Combatant`], [`Arena`] and [`Presenter`] traits.

use crate::state::{CombatantId, Position, Team};

/// Effective stats the engine may read from a combatant.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatKey {
    Attack,
    Magic,
    Defense,
    Resistance,
    Speed,
    Accuracy,
    Evasion,
    CritChance,
    HealPower,
    MaxHp,
}

/// Damage element forwarded to mitigation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Element {
    Physical,
    Fire,
    Frost,
    Lightning,
    Holy,
    Shadow,
    Nature,
}

/// What an outcome did to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeKind {
    Damage,
    Heal,
    Shield,
}

/// Request passed to [`Combatant::receive_action`].
#[derive(Clone, Debug, PartialEq)]
pub struct ActionRequest {
    pub source: CombatantId,
    pub amount: f64,
    pub kind: OutcomeKind,
    pub element: Option<Element>,
    pub attacker_accuracy: Option<f64>,
    pub attacker_crit_chance: Option<f64>,
}

impl ActionRequest {
    pub fn damage(source: CombatantId, amount: f64) -> Self {
        Self {
            source,
            amount,
            kind: OutcomeKind::Damage,
            element: None,
            attacker_accuracy: None,
            attacker_crit_chance: None,
        }
    }

    pub fn heal(source: CombatantId, amount: f64) -> Self {
        Self {
            kind: OutcomeKind::Heal,
            ..Self::damage(source, amount)
        }
    }
}

/// What the combatant model actually applied after mitigation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActionReceipt {
    pub amount: f64,
    pub was_evaded: bool,
    pub was_critical: bool,
}

/// A combatant as seen by the engine.
pub trait Combatant {
    fn id(&self) -> CombatantId;
    fn team(&self) -> Team;
    fn position(&self) -> Position;
    fn hp(&self) -> f64;
    fn max_hp(&self) -> f64;

    fn is_alive(&self) -> bool {
        self.hp() > 0.0
    }

    /// Effective stat value before engine-side modifiers.
    fn stat(&self, stat: StatKey) -> f64;

    /// Applies damage or healing, including mitigation, evasion and crits.
    fn receive_action(&mut self, request: &ActionRequest) -> ActionReceipt;
}

/// Lookup of the combatants taking part in a battle.
pub trait Arena {
    fn combatant(&self, id: CombatantId) -> Option<&dyn Combatant>;
    fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut dyn Combatant>;

    /// All combatant ids, in ascending order.
    fn ids(&self) -> Vec<CombatantId>;

    fn is_alive(&self, id: CombatantId) -> bool {
        self.combatant(id).is_some_and(|c| c.is_alive())
    }

    fn view(&self, id: CombatantId) -> Option<CombatantView> {
        self.combatant(id).map(CombatantView::of)
    }
}

/// Read-only snapshot of a combatant used by decisions and passives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombatantView {
    pub id: CombatantId,
    pub team: Team,
    pub position: Position,
    pub hp: f64,
    pub max_hp: f64,
    pub alive: bool,
}

impl CombatantView {
    pub fn of(combatant: &dyn Combatant) -> Self {
        Self {
            id: combatant.id(),
            team: combatant.team(),
            position: combatant.position(),
            hp: combatant.hp(),
            max_hp: combatant.max_hp(),
            alive: combatant.is_alive(),
        }
    }

    /// HP as a fraction of max HP, in `[0, 1]`.
    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn distance_to(&self, other: &CombatantView) -> f64 {
        self.position.distance(&other.position)
    }
}

/// Style hint for floating combat text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextStyle {
    Damage,
    Critical,
    Heal,
    Shield,
    Evade,
    Status,
}

/// Fire-and-forget presentation sink. Nothing it returns feeds back into the
/// simulation.
pub trait Presenter {
    fn show_floating_text(&mut self, _target: CombatantId, _text: &str, _style: TextStyle) {}
    fn play_vfx(&mut self, _target: CombatantId, _name: &str) {}
    fn show_projectile(&mut self, _from: CombatantId, _to: CombatantId, _name: &str) {}
    fn show_ability_name(&mut self, _actor: CombatantId, _name: &str) {}
}

/// Presenter that drops everything (headless simulation, tests).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
