use bitflags::bitflags;

use crate::combatant::StatKey;

/// Category of a timed effect.
///
/// Known categories carry built-in engine semantics (shield absorption,
/// action gating, stat modification, periodic damage/healing). Kit-specific
/// counters and timers use [`EffectKind::Custom`] together with the opaque
/// numeric `params` on the effect spec.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    // ========================================================================
    // Defensive
    // ========================================================================
    /// Absorbs incoming damage up to `magnitude` before HP is touched.
    Shield,

    // ========================================================================
    // Periodic
    // ========================================================================
    /// Damage dealt on every interval tick.
    DamageOverTime,

    /// Healing received on every interval tick.
    HealOverTime,

    // ========================================================================
    // Crowd Control
    // ========================================================================
    /// Cannot act at all.
    Stun,

    /// Can only use basic attacks.
    Silence,

    /// Single-target hostile abilities must target the effect's source.
    Taunt,

    // ========================================================================
    // Modifiers
    // ========================================================================
    /// Fractional bonus (`magnitude × stacks`) to a stat; negative for debuffs.
    StatModifier(StatKey),

    /// Kit-defined effect identified by name.
    Custom(String),
}

impl EffectKind {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Tags assumed when a spec does not declare its own.
    pub fn default_tags(&self) -> EffectTags {
        match self {
            Self::Shield | Self::HealOverTime => EffectTags::BENEFICIAL | EffectTags::DISPELLABLE,
            Self::DamageOverTime => EffectTags::HARMFUL | EffectTags::DISPELLABLE,
            Self::Stun | Self::Silence | Self::Taunt => {
                EffectTags::HARMFUL | EffectTags::CROWD_CONTROL | EffectTags::DISPELLABLE
            }
            Self::StatModifier(_) => EffectTags::DISPELLABLE,
            Self::Custom(_) => EffectTags::empty(),
        }
    }

    /// Short human-readable name for floating text and logs.
    pub fn label(&self) -> &str {
        match self {
            Self::Shield => "Shield",
            Self::DamageOverTime => "Burning",
            Self::HealOverTime => "Regen",
            Self::Stun => "Stunned",
            Self::Silence => "Silenced",
            Self::Taunt => "Taunted",
            Self::StatModifier(stat) => stat.as_ref(),
            Self::Custom(name) => name,
        }
    }

    pub fn is_crowd_control(&self) -> bool {
        matches!(self, Self::Stun | Self::Silence | Self::Taunt)
    }
}

bitflags! {
    /// Classification flags used by cleanse/dispel and by presentation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EffectTags: u8 {
        const BENEFICIAL    = 1 << 0;
        const HARMFUL       = 1 << 1;
        const CROWD_CONTROL = 1 << 2;
        const DISPELLABLE   = 1 << 3;
        /// Not surfaced to presentation (bookkeeping timers, internal stacks).
        const HIDDEN        = 1 << 4;
    }
}

/// How a new application merges with existing instances of the same kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackingRule {
    /// One instance per (kind, source); re-application refreshes and stacks.
    #[default]
    UniquePerSource,

    /// One instance per kind regardless of source.
    UniquePerKind,

    /// Every application is a separate instance.
    Independent,
}

/// What happens when an effect's duration runs out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExpiresAction {
    #[default]
    Remove,

    /// Renew for another `total_duration` (cyclic timers, recurring auras).
    Reapply,
}

/// Work performed when a periodic effect ticks or an effect expires.
///
/// Payloads are plain data; the engine dispatches them after the registry
/// tick, so no effect ever holds a callback into combatant state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TickPayload {
    /// Damage the effect owner by `magnitude × stacks`.
    Damage,

    /// Heal the effect owner by `magnitude × stacks`.
    Heal,

    /// Grant the effect owner `magnitude × stacks` of its own resource.
    GainResource { resource: String, cap: f64 },

    /// Kit-defined behaviour, dispatched to the source's kit.
    Script { hook: u32 },
}
