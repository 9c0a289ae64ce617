//! Resource Ledger: per-combatant named currencies (rage, charges, ammo...).
//!
//! Every resource obeys `0 ≤ value ≤ cap` at all observation points. Values
//! are clamped on every write, so scripts never need their own bounds checks.
//! Unknown resources read as `0` and are created lazily on first gain.
//!
//! # Decay
//!
//! A resource with a [`DecayRule`] loses `rate_per_second` once
//! `delay_seconds` have passed without a gain. Time since the last gain is
//! tracked per resource and advanced by [`ResourceLedger::decay_tick`], so
//! decay uses the same simulated clock as everything else.

use std::collections::BTreeMap;

use crate::state::Seconds;

/// Decay configuration for a resource.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecayRule {
    pub rate_per_second: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub delay_seconds: Seconds,
}

impl DecayRule {
    pub fn new(rate_per_second: f64, delay_seconds: Seconds) -> Self {
        Self {
            rate_per_second,
            delay_seconds,
        }
    }

    fn is_active(&self) -> bool {
        self.rate_per_second.is_finite() && self.rate_per_second > 0.0
    }
}

/// Resource a kit declares up front (cap, decay, starting value).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceDeclaration {
    pub name: String,
    pub cap: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub decay: Option<DecayRule>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial: f64,
}

impl ResourceDeclaration {
    pub fn new(name: impl Into<String>, cap: f64) -> Self {
        Self {
            name: name.into(),
            cap,
            decay: None,
            initial: 0.0,
        }
    }

    pub fn with_decay(mut self, decay: DecayRule) -> Self {
        self.decay = Some(decay);
        self
    }

    pub fn with_initial(mut self, initial: f64) -> Self {
        self.initial = initial;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resource {
    pub value: f64,
    pub cap: f64,
    pub decay: Option<DecayRule>,
    /// Simulated seconds since the last positive gain.
    since_gain: Seconds,
}

impl Resource {
    fn new(cap: f64) -> Self {
        Self {
            value: 0.0,
            cap: sanitize_cap(cap),
            decay: None,
            since_gain: 0.0,
        }
    }

    pub fn since_gain(&self) -> Seconds {
        self.since_gain
    }

    fn clamp(&mut self) {
        self.value = if self.value.is_finite() {
            self.value.clamp(0.0, self.cap)
        } else {
            0.0
        };
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceLedger {
    resources: BTreeMap<String, Resource>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or reconfigures) a resource.
    pub fn declare(&mut self, declaration: &ResourceDeclaration) {
        let resource = self
            .resources
            .entry(declaration.name.clone())
            .or_insert_with(|| Resource::new(declaration.cap));
        resource.cap = sanitize_cap(declaration.cap);
        resource.decay = declaration.decay;
        resource.value = declaration.initial;
        resource.clamp();
    }

    /// Adds `amount` (which may be negative) and clamps to `[0, cap]`.
    ///
    /// `cap` becomes the resource's cap. A positive amount resets the decay delay.
    /// Returns the new value.
    pub fn add(&mut self, name: &str, amount: f64, cap: f64) -> f64 {
        let resource = self
            .resources
            .entry(name.to_string())
            .or_insert_with(|| Resource::new(cap));
        resource.cap = sanitize_cap(cap);

        if amount.is_finite() {
            resource.value += amount;
            if amount > 0.0 {
                resource.since_gain = 0.0;
            }
        }
        resource.clamp();
        resource.value
    }

    /// Adds `amount` using the resource's current cap (unbounded gains on
    /// undeclared resources are capped at zero, i.e. dropped).
    pub fn gain(&mut self, name: &str, amount: f64) -> f64 {
        let cap = self.cap(name).unwrap_or(0.0);
        self.add(name, amount, cap)
    }

    /// Consumes up to `amount`. Returns what was actually consumed.
    pub fn consume(&mut self, name: &str, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let Some(resource) = self.resources.get_mut(name) else {
            return 0.0;
        };

        let consumed = amount.min(resource.value);
        resource.value -= consumed;
        resource.clamp();
        consumed
    }

    /// Consumes exactly `amount` or nothing.
    pub fn try_consume(&mut self, name: &str, amount: f64) -> bool {
        if !amount.is_finite() || amount <= 0.0 {
            return true;
        }
        if self.get(name) + f64::EPSILON < amount {
            return false;
        }
        self.consume(name, amount);
        true
    }

    /// Sets the value directly (clamped).
    pub fn set(&mut self, name: &str, value: f64) -> f64 {
        let Some(resource) = self.resources.get_mut(name) else {
            return 0.0;
        };
        resource.value = value;
        resource.clamp();
        resource.value
    }

    /// Advances decay timers by `dt`.
    ///
    /// Only the part of `dt` past the decay delay decays, so results do not
    /// depend on how the elapsed time is split across ticks.
    pub fn decay_tick(&mut self, dt: Seconds) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        for resource in self.resources.values_mut() {
            let before = resource.since_gain;
            resource.since_gain += dt;

            let Some(rule) = resource.decay.filter(DecayRule::is_active) else {
                continue;
            };
            let delay = rule.delay_seconds.max(0.0);
            let decaying = (resource.since_gain - delay).max(0.0) - (before - delay).max(0.0);
            if decaying > 0.0 {
                resource.value -= rule.rate_per_second * decaying;
                resource.clamp();
            }
        }
    }

    /// Current value; `0` for unknown resources.
    pub fn get(&self, name: &str) -> f64 {
        self.resources.get(name).map_or(0.0, |r| r.value)
    }

    pub fn cap(&self, name: &str) -> Option<f64> {
        self.resources.get(name).map(|r| r.cap)
    }

    /// True when the resource is at its cap (and the cap is non-zero).
    pub fn is_full(&self, name: &str) -> bool {
        self.resources
            .get(name)
            .is_some_and(|r| r.cap > 0.0 && r.value >= r.cap)
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(name, r)| (name.as_str(), r))
    }
}

fn sanitize_cap(cap: f64) -> f64 {
    if cap.is_finite() { cap.max(0.0) } else { 0.0 }
}
