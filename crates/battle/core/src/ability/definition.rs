use std::borrow::Borrow;
use std::fmt;

use crate::combatant::{Element, StatKey};
use crate::config::EngineConfig;
use crate::state::Seconds;
use crate::status::{EffectKind, TimedEffectSpec};

/// Identifier of an ability within a kit.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AbilityId(String);

impl AbilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn basic_attack() -> Self {
        Self::new(EngineConfig::BASIC_ATTACK)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AbilityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for AbilityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Slot an ability occupies in the decision priority order.
///
/// Declaration order is also priority order: ultimates are considered first,
/// basic attacks last.
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
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AbilityKind {
    Ultimate,
    Support,
    Control,
    Skill,
    Basic,
    /// Never cast; its behaviour lives in the kit's passive updater.
    Passive,
}

impl AbilityKind {
    /// Priority tier, lower is considered first.
    pub fn tier(self) -> u8 {
        match self {
            Self::Ultimate => 0,
            Self::Support | Self::Control => 1,
            Self::Skill => 2,
            Self::Basic => 3,
            Self::Passive => u8::MAX,
        }
    }
}

/// How a single target is chosen among candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetRule {
    /// Lowest HP fraction, then nearest, then lowest id.
    #[default]
    LowestHp,
    /// Nearest, then lowest HP fraction, then lowest id.
    Nearest,
    /// Highest current HP, then nearest, then lowest id.
    HighestHp,
    /// Seeded random pick.
    Random,
}

/// Who an ability can be aimed at.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetingMode {
    SelfOnly,
    Enemy(TargetRule),
    /// Allies including the caster.
    Ally(TargetRule),
    AllEnemies,
    AllAllies,
    /// Densest group of enemies within `radius` of one of them.
    EnemyCluster { radius: f64 },
}

impl TargetingMode {
    pub fn is_hostile(&self) -> bool {
        matches!(
            self,
            Self::Enemy(_) | Self::AllEnemies | Self::EnemyCluster { .. }
        )
    }
}

impl Default for TargetingMode {
    fn default() -> Self {
        Self::Enemy(TargetRule::default())
    }
}

/// Magnitude formula: `stat × ratio + flat + consumed × per_consumed`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scaling {
    pub stat: StatKey,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ratio: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flat: f64,
    /// Bonus per unit of resource consumed by the cast.
    #[cfg_attr(feature = "serde", serde(default))]
    pub per_consumed: f64,
}

impl Scaling {
    pub fn new(stat: StatKey, ratio: f64) -> Self {
        Self {
            stat,
            ratio,
            flat: 0.0,
            per_consumed: 0.0,
        }
    }

    pub fn flat(amount: f64) -> Self {
        Self {
            stat: StatKey::Attack,
            ratio: 0.0,
            flat: amount,
            per_consumed: 0.0,
        }
    }

    pub fn plus(mut self, flat: f64) -> Self {
        self.flat = flat;
        self
    }

    pub fn per_consumed(mut self, per_consumed: f64) -> Self {
        self.per_consumed = per_consumed;
        self
    }
}

/// Whether an effect spec lands on the ability's target or on its caster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectTarget {
    #[default]
    Target,
    Caster,
}

/// One unit of work an ability performs on each of its targets.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    Damage {
        scaling: Scaling,
        #[cfg_attr(feature = "serde", serde(default))]
        element: Option<Element>,
    },
    Heal {
        scaling: Scaling,
    },
    /// Absorption recorded as a `Shield` effect on the target.
    Shield {
        scaling: Scaling,
        duration: Seconds,
    },
    ApplyEffect {
        spec: TimedEffectSpec,
        #[cfg_attr(feature = "serde", serde(default))]
        on: EffectTarget,
    },
    /// Grants the caster its own resource (resources are self-scoped).
    GainResource {
        resource: String,
        amount: f64,
        cap: f64,
    },
    /// Lowers one of the caster's cooldowns.
    RefundCooldown {
        ability: AbilityId,
        seconds: Seconds,
    },
    /// Grants the caster a free follow-up cast of `ability`.
    GrantFreeCast {
        ability: AbilityId,
    },
    /// Removes dispellable harmful effects from the target.
    Cleanse,
    /// Kit-defined behaviour.
    Script {
        hook: u32,
    },
}

/// Resource spent on cast.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceCost {
    pub resource: String,
    pub amount: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: CostMode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CostMode {
    /// Abort the cast when the full amount is not available.
    #[default]
    Hard,
    /// Consume whatever is available (possibly nothing).
    Partial,
}

/// Multi-phase timeline: windup, ticking active phase, resolution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelSpec {
    #[cfg_attr(feature = "serde", serde(default))]
    pub windup: Seconds,
    pub duration: Seconds,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pulse_interval: Option<Seconds>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pulse: Vec<Payload>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resolution: Vec<Payload>,
}

/// Payload delivered some time after the cast.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DelayedPayload {
    pub delay: Seconds,
    pub payload: Payload,
}

/// Situational predicate the decision heuristic checks before choosing an ability.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UseCondition {
    #[default]
    Always,
    /// At least `count` living enemies within `radius` of some enemy.
    EnemiesClustered { count: usize, radius: f64 },
    /// Some ally (including self) below this HP fraction.
    AllyHpBelow(f64),
    SelfHpBelow(f64),
    ResourceAtLeast { resource: String, amount: f64 },
    /// The chosen target does not carry this effect kind yet.
    TargetLacks(EffectKind),
}

/// Static metadata of an ability (the parsed form of a kit's design data).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityDefinition {
    pub id: AbilityId,
    pub name: String,
    pub kind: AbilityKind,

    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: Seconds,

    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: Option<ResourceCost>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub targeting: TargetingMode,

    #[cfg_attr(feature = "serde", serde(default))]
    pub payloads: Vec<Payload>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub delayed: Vec<DelayedPayload>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub channel: Option<ChannelSpec>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub condition: UseCondition,

    /// Presentation hint forwarded to [`Presenter::play_vfx`](crate::Presenter::play_vfx).
    #[cfg_attr(feature = "serde", serde(default))]
    pub vfx: Option<String>,
}

impl AbilityDefinition {
    pub fn new(id: impl Into<String>, kind: AbilityKind) -> Self {
        let id = AbilityId::new(id);
        Self {
            name: id.as_str().to_string(),
            id,
            kind,
            cooldown: 0.0,
            cost: None,
            targeting: TargetingMode::default(),
            payloads: Vec::new(),
            delayed: Vec::new(),
            channel: None,
            condition: UseCondition::Always,
            vfx: None,
        }
    }

    /// Built-in fallback every actor can use: `Attack × 1.0` physical damage
    /// on the lowest-HP enemy.
    pub fn basic_attack() -> Self {
        Self::new(EngineConfig::BASIC_ATTACK, AbilityKind::Basic)
            .with_name("Attack")
            .with_payload(Payload::Damage {
                scaling: Scaling::new(StatKey::Attack, 1.0),
                element: Some(Element::Physical),
            })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_cooldown(mut self, seconds: Seconds) -> Self {
        self.cooldown = seconds;
        self
    }

    pub fn with_cost(mut self, resource: impl Into<String>, amount: f64, mode: CostMode) -> Self {
        self.cost = Some(ResourceCost {
            resource: resource.into(),
            amount,
            mode,
        });
        self
    }

    pub fn with_targeting(mut self, targeting: TargetingMode) -> Self {
        self.targeting = targeting;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payloads.push(payload);
        self
    }

    pub fn with_delayed(mut self, delay: Seconds, payload: Payload) -> Self {
        self.delayed.push(DelayedPayload { delay, payload });
        self
    }

    pub fn with_channel(mut self, channel: ChannelSpec) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_condition(mut self, condition: UseCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn is_castable_kind(&self) -> bool {
        self.kind != AbilityKind::Passive
    }
}
