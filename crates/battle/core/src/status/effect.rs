use std::collections::BTreeMap;
use std::fmt;

use super::kind::{EffectKind, EffectTags, ExpiresAction, StackingRule, TickPayload};
use crate::config::EngineConfig;
use crate::state::{CombatantId, Seconds};

/// Stable identifier of an effect instance within one registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectHandle(pub u64);

impl fmt::Display for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect:{}", self.0)
    }
}

#[cfg(feature = "serde")]
fn one() -> u32 {
    1
}

/// Request to apply a timed effect.
///
/// Specs are authored in ability metadata and may be malformed; they are
/// sanitized when registered (see [`TimedEffectSpec::sanitized`]) instead of
/// being rejected.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimedEffectSpec {
    pub kind: EffectKind,

    #[cfg_attr(feature = "serde", serde(default))]
    pub magnitude: f64,

    /// Duration in seconds; `f64::INFINITY` for permanent effects.
    pub duration: Seconds,

    /// Stacks granted by one application.
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub stacks: u32,

    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub max_stacks: u32,

    #[cfg_attr(feature = "serde", serde(default))]
    pub tick_interval: Option<Seconds>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub tick_payload: Option<TickPayload>,

    /// Fired once on natural expiry (never on cleanse).
    #[cfg_attr(feature = "serde", serde(default))]
    pub expire_payload: Option<TickPayload>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub stacking: StackingRule,

    #[cfg_attr(feature = "serde", serde(default))]
    pub expires: ExpiresAction,

    /// Overrides [`EffectKind::default_tags`] when present.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Option<EffectTags>,

    /// Opaque kind-specific numeric parameters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: BTreeMap<String, f64>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub source: CombatantId,
}

impl TimedEffectSpec {
    pub fn new(kind: EffectKind, magnitude: f64, duration: Seconds) -> Self {
        Self {
            kind,
            magnitude,
            duration,
            stacks: 1,
            max_stacks: EngineConfig::DEFAULT_MAX_STACKS,
            tick_interval: None,
            tick_payload: None,
            expire_payload: None,
            stacking: StackingRule::default(),
            expires: ExpiresAction::default(),
            tags: None,
            params: BTreeMap::new(),
            source: CombatantId::SYSTEM,
        }
    }

    /// Permanent effect (auras maintained by passives).
    pub fn permanent(kind: EffectKind, magnitude: f64) -> Self {
        Self::new(kind, magnitude, f64::INFINITY)
    }

    pub fn from_source(mut self, source: CombatantId) -> Self {
        self.source = source;
        self
    }

    pub fn with_max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks;
        self
    }

    pub fn with_stacks(mut self, stacks: u32) -> Self {
        self.stacks = stacks;
        self
    }

    pub fn ticking(mut self, interval: Seconds, payload: TickPayload) -> Self {
        self.tick_interval = Some(interval);
        self.tick_payload = Some(payload);
        self
    }

    pub fn on_expire(mut self, payload: TickPayload) -> Self {
        self.expire_payload = Some(payload);
        self
    }

    pub fn with_stacking(mut self, stacking: StackingRule) -> Self {
        self.stacking = stacking;
        self
    }

    pub fn with_expires(mut self, expires: ExpiresAction) -> Self {
        self.expires = expires;
        self
    }

    pub fn with_tags(mut self, tags: EffectTags) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Clamps every field into its valid domain.
    ///
    /// - non-finite or negative magnitude/duration → `0` (infinite duration is kept)
    /// - `max_stacks == 0` → `1`; `stacks` clamped to `[1, max_stacks]`
    /// - non-positive interval → no periodic ticking; short intervals raised to `min_interval`
    /// - renewing (`Reapply`) durations raised to `min_interval`
    /// - shields never stack
    /// - non-finite params are dropped
    pub fn sanitized(mut self, min_interval: Seconds) -> Self {
        if !self.magnitude.is_finite() {
            self.magnitude = 0.0;
        }
        if self.duration.is_nan() || self.duration < 0.0 {
            self.duration = 0.0;
        }
        if self.expires == ExpiresAction::Reapply
            && self.duration.is_finite()
            && self.duration > 0.0
        {
            self.duration = self.duration.max(min_interval);
        }
        // A shield is a single absorption pool.
        if self.kind == EffectKind::Shield {
            self.max_stacks = 1;
        }
        self.max_stacks = self.max_stacks.max(1);
        self.stacks = self.stacks.clamp(1, self.max_stacks);
        self.tick_interval = match self.tick_interval {
            Some(interval) if interval.is_finite() && interval > 0.0 => {
                Some(interval.max(min_interval))
            }
            _ => None,
        };
        self.params.retain(|_, value| value.is_finite());
        self
    }

    pub fn effective_tags(&self) -> EffectTags {
        self.tags.unwrap_or_else(|| self.kind.default_tags())
    }
}

/// A live effect attached to a combatant.
///
/// Invariants maintained by the registry:
/// - `stacks ∈ [1, max_stacks]`
/// - `0 < duration_remaining ≤ total_duration` while the effect is observable
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimedEffect {
    pub handle: EffectHandle,
    pub kind: EffectKind,
    pub magnitude: f64,
    pub duration_remaining: Seconds,
    pub total_duration: Seconds,
    pub stacks: u32,
    pub max_stacks: u32,
    pub tick_interval: Option<Seconds>,
    pub tick_payload: Option<TickPayload>,
    pub expire_payload: Option<TickPayload>,
    pub source: CombatantId,
    pub stacking: StackingRule,
    pub expires: ExpiresAction,
    pub tags: EffectTags,
    pub params: BTreeMap<String, f64>,

    /// Time accumulated towards the next interval tick.
    pub(crate) tick_elapsed: Seconds,
}

impl TimedEffect {
    pub(crate) fn from_spec(handle: EffectHandle, spec: TimedEffectSpec) -> Self {
        let tags = spec.effective_tags();
        Self {
            handle,
            kind: spec.kind,
            magnitude: spec.magnitude,
            duration_remaining: spec.duration,
            total_duration: spec.duration,
            stacks: spec.stacks,
            max_stacks: spec.max_stacks,
            tick_interval: spec.tick_interval,
            tick_payload: spec.tick_payload,
            expire_payload: spec.expire_payload,
            source: spec.source,
            stacking: spec.stacking,
            expires: spec.expires,
            tags,
            params: spec.params,
            tick_elapsed: 0.0,
        }
    }

    /// Per-tick amount delivered by payloads.
    pub fn amount(&self) -> f64 {
        self.magnitude * f64::from(self.stacks)
    }

    pub fn param(&self, name: &str) -> f64 {
        self.params.get(name).copied().unwrap_or(0.0)
    }

    pub fn is_permanent(&self) -> bool {
        self.duration_remaining.is_infinite()
    }

    pub fn is_harmful(&self) -> bool {
        self.tags.contains(EffectTags::HARMFUL)
    }

    pub fn is_beneficial(&self) -> bool {
        self.tags.contains(EffectTags::BENEFICIAL)
    }

    pub fn is_dispellable(&self) -> bool {
        self.tags.contains(EffectTags::DISPELLABLE)
    }

    /// Time elapsed since the current application window began.
    pub fn elapsed(&self) -> Seconds {
        (self.total_duration - self.duration_remaining).max(0.0)
    }
}
