//! Per-combatant collection of active timed effects.
//!
//! # Tick ordering
//!
//! [`EffectRegistry::tick`] advances every effect by the same `dt`:
//!
//! 1. Interval time is accumulated only up to the effect's remaining
//!    duration, and one pulse is emitted per whole interval elapsed. A `dt`
//!    spanning several intervals emits several pulses.
//! 2. Effects whose duration runs out emit their expiry pulse (if any) after
//!    their final interval pulse, then leave the registry.
//!
//! Pulses are returned as data. The caller (the engine) applies them after
//! the registry tick has completed, so payload execution never observes a
//! half-ticked registry.

use super::effect::{EffectHandle, TimedEffect, TimedEffectSpec};
use super::kind::{EffectKind, ExpiresAction, StackingRule, TickPayload};
use crate::combatant::StatKey;
use crate::config::EngineConfig;
use crate::state::{CombatantId, Seconds};

const EPSILON: f64 = EngineConfig::TIME_EPSILON;

/// Why a pulse fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PulseTrigger {
    Interval,
    Expiry,
}

/// One payload firing produced by a registry tick.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectPulse {
    /// Combatant carrying the effect.
    pub owner: CombatantId,
    pub source: CombatantId,
    pub handle: EffectHandle,
    pub kind: EffectKind,
    pub payload: TickPayload,
    /// `magnitude × stacks` at the time of firing.
    pub amount: f64,
    pub trigger: PulseTrigger,
}

/// Result of advancing a registry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectTickReport {
    /// Pulses in firing order.
    pub pulses: Vec<EffectPulse>,
    /// Effects removed by natural expiry.
    pub expired: Vec<TimedEffect>,
}

impl EffectTickReport {
    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty() && self.expired.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectRegistry {
    effects: Vec<TimedEffect>,
    next_handle: u64,
    min_tick_interval: Seconds,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::with_min_tick_interval(EngineConfig::DEFAULT_MIN_TICK_INTERVAL)
    }

    pub fn with_min_tick_interval(min_tick_interval: Seconds) -> Self {
        Self {
            effects: Vec::new(),
            next_handle: 0,
            min_tick_interval,
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Applies an effect, merging into an existing instance when the stacking
    /// rule says so.
    ///
    /// Merging takes the longer of the remaining and the new duration, adds the
    /// new stacks (clamped to `max_stacks`), and adopts the latest magnitude and
    /// payloads. Returns `None` when a new zero-duration effect would be
    /// inserted, since it would expire before any tick observes it.
    pub fn apply(&mut self, spec: TimedEffectSpec) -> Option<EffectHandle> {
        let spec = spec.sanitized(self.min_tick_interval);

        let existing = match spec.stacking {
            StackingRule::UniquePerSource => self
                .effects
                .iter_mut()
                .find(|e| e.kind == spec.kind && e.source == spec.source),
            StackingRule::UniquePerKind => self.effects.iter_mut().find(|e| e.kind == spec.kind),
            StackingRule::Independent => None,
        };

        if let Some(effect) = existing {
            merge(effect, spec);
            return Some(effect.handle);
        }

        if spec.duration <= EPSILON {
            tracing::trace!(kind = ?spec.kind, "dropping zero-duration effect");
            return None;
        }

        let handle = EffectHandle(self.next_handle);
        self.next_handle += 1;
        self.effects.push(TimedEffect::from_spec(handle, spec));
        Some(handle)
    }

    /// Advances all effects by `dt` seconds.
    ///
    /// A non-positive or non-finite `dt` leaves the registry untouched.
    pub fn tick(&mut self, owner: CombatantId, dt: Seconds) -> EffectTickReport {
        let mut report = EffectTickReport::default();
        if !dt.is_finite() || dt <= 0.0 {
            return report;
        }

        for effect in &mut self.effects {
            let progress = advance(effect, dt);

            if let Some(payload) = &effect.tick_payload {
                for _ in 0..progress.interval_pulses {
                    report
                        .pulses
                        .push(pulse(owner, effect, payload.clone(), PulseTrigger::Interval));
                }
            }
            if let Some(payload) = &effect.expire_payload {
                let expiries = progress.renewals + u32::from(progress.expired);
                for _ in 0..expiries {
                    report
                        .pulses
                        .push(pulse(owner, effect, payload.clone(), PulseTrigger::Expiry));
                }
            }
        }

        let (expired, live): (Vec<_>, Vec<_>) = self
            .effects
            .drain(..)
            .partition(|e| e.duration_remaining <= EPSILON);
        self.effects = live;
        report.expired = expired;
        report
    }

    /// Removes every effect matching `predicate`, regardless of duration.
    ///
    /// Expiry payloads do not fire. Returns the removed effects.
    pub fn remove<F>(&mut self, mut predicate: F) -> Vec<TimedEffect>
    where
        F: FnMut(&TimedEffect) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.effects.drain(..).partition(|e| predicate(e));
        self.effects = kept;
        removed
    }

    pub fn remove_handle(&mut self, handle: EffectHandle) -> Option<TimedEffect> {
        let idx = self.effects.iter().position(|e| e.handle == handle)?;
        Some(self.effects.remove(idx))
    }

    /// Removes dispellable harmful effects. Returns how many were removed.
    pub fn cleanse_harmful(&mut self) -> usize {
        self.remove(|e| e.is_harmful() && e.is_dispellable()).len()
    }

    /// Removes dispellable beneficial effects. Returns how many were removed.
    pub fn purge_beneficial(&mut self) -> usize {
        self.remove(|e| e.is_beneficial() && e.is_dispellable()).len()
    }

    /// Removes up to `count` stacks of `kind`, oldest instance first.
    ///
    /// Instances reaching zero stacks are removed. Returns the number of stacks
    /// actually consumed, which may be less than requested.
    pub fn consume_stacks(&mut self, kind: &EffectKind, count: u32) -> u32 {
        self.consume_matching(|e| &e.kind == kind, count)
    }

    /// Like [`consume_stacks`](Self::consume_stacks), restricted to instances
    /// applied by `source`.
    pub fn consume_stacks_from(
        &mut self,
        kind: &EffectKind,
        source: CombatantId,
        count: u32,
    ) -> u32 {
        self.consume_matching(|e| &e.kind == kind && e.source == source, count)
    }

    fn consume_matching<F>(&mut self, mut predicate: F, count: u32) -> u32
    where
        F: FnMut(&TimedEffect) -> bool,
    {
        let mut left = count;
        for effect in self.effects.iter_mut().filter(|e| predicate(e)) {
            if left == 0 {
                break;
            }
            let take = left.min(effect.stacks);
            effect.stacks -= take;
            left -= take;
        }
        self.effects.retain(|e| e.stacks > 0);
        count - left
    }

    /// Absorbs incoming damage with active shields, oldest first.
    ///
    /// A shield's `magnitude` is its remaining absorption pool; depleted shields
    /// are removed. Returns the amount absorbed.
    pub fn absorb(&mut self, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }

        let mut left = amount;
        for shield in self
            .effects
            .iter_mut()
            .filter(|e| e.kind == EffectKind::Shield)
        {
            if left <= 0.0 {
                break;
            }
            let take = left.min(shield.magnitude.max(0.0));
            shield.magnitude = (shield.magnitude - take).max(0.0);
            left -= take;
        }
        self.effects
            .retain(|e| !(e.kind == EffectKind::Shield && e.magnitude <= EPSILON));
        amount - left
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    // ========================================================================
    // Queries (read-only)
    // ========================================================================

    /// First active effect of `kind`.
    pub fn query(&self, kind: &EffectKind) -> Option<&TimedEffect> {
        self.effects.iter().find(|e| &e.kind == kind)
    }

    /// Active effect of `kind` applied by `source`.
    pub fn query_from(&self, kind: &EffectKind, source: CombatantId) -> Option<&TimedEffect> {
        self.effects
            .iter()
            .find(|e| &e.kind == kind && e.source == source)
    }

    pub fn query_all(&self) -> &[TimedEffect] {
        &self.effects
    }

    pub fn get(&self, handle: EffectHandle) -> Option<&TimedEffect> {
        self.effects.iter().find(|e| e.handle == handle)
    }

    pub fn has(&self, kind: &EffectKind) -> bool {
        self.query(kind).is_some()
    }

    /// Total stacks of `kind` across all sources.
    pub fn stacks(&self, kind: &EffectKind) -> u32 {
        self.effects
            .iter()
            .filter(|e| &e.kind == kind)
            .map(|e| e.stacks)
            .sum()
    }

    /// Remaining absorption across all shields.
    pub fn shield_total(&self) -> f64 {
        self.effects
            .iter()
            .filter(|e| e.kind == EffectKind::Shield)
            .fold(0.0, |total, e| total + e.magnitude.max(0.0))
    }

    /// Sum of fractional modifiers for `stat`.
    pub fn stat_bonus(&self, stat: StatKey) -> f64 {
        self.effects
            .iter()
            .filter(|e| e.kind == EffectKind::StatModifier(stat))
            .map(TimedEffect::amount)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn merge(effect: &mut TimedEffect, spec: TimedEffectSpec) {
    effect.duration_remaining = effect.duration_remaining.max(spec.duration);
    effect.total_duration = effect.total_duration.max(effect.duration_remaining);
    effect.max_stacks = spec.max_stacks;
    effect.stacks = effect
        .stacks
        .saturating_add(spec.stacks)
        .min(effect.max_stacks);
    effect.magnitude = spec.magnitude;
    effect.source = spec.source;
    effect.tick_interval = spec.tick_interval;
    effect.tick_payload = spec.tick_payload;
    effect.expire_payload = spec.expire_payload;
    effect.expires = spec.expires;
    effect.params.extend(spec.params);
}

#[derive(Default)]
struct Progress {
    interval_pulses: u32,
    renewals: u32,
    expired: bool,
}

fn advance(effect: &mut TimedEffect, dt: Seconds) -> Progress {
    let mut progress = Progress::default();
    let mut left = dt;

    loop {
        let step = left.min(effect.duration_remaining);

        if let Some(interval) = effect.tick_interval {
            effect.tick_elapsed += step;
            while effect.tick_elapsed + EPSILON >= interval {
                effect.tick_elapsed -= interval;
                progress.interval_pulses += 1;
            }
            effect.tick_elapsed = effect.tick_elapsed.max(0.0);
        }

        effect.duration_remaining -= step;
        left -= step;

        if effect.duration_remaining <= EPSILON {
            let renewable = effect.expires == ExpiresAction::Reapply
                && effect.total_duration.is_finite()
                && effect.total_duration > EPSILON;
            if !renewable {
                effect.duration_remaining = 0.0;
                progress.expired = true;
                break;
            }
            effect.duration_remaining = effect.total_duration;
            progress.renewals += 1;
        }

        if left <= EPSILON {
            break;
        }
    }

    progress
}

fn pulse(
    owner: CombatantId,
    effect: &TimedEffect,
    payload: TickPayload,
    trigger: PulseTrigger,
) -> EffectPulse {
    EffectPulse {
        owner,
        source: effect.source,
        handle: effect.handle,
        kind: effect.kind.clone(),
        payload,
        amount: effect.amount(),
        trigger,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::EffectTags;

    const OWNER: CombatantId = CombatantId(1);

    fn poison(source: u32) -> TimedEffectSpec {
        TimedEffectSpec::new(EffectKind::DamageOverTime, 10.0, 5.0)
            .ticking(2.0, TickPayload::Damage)
            .from_source(CombatantId(source))
    }

    #[test]
    fn unique_per_source_refreshes_and_stacks() {
        let mut registry = EffectRegistry::new();
        let buff = |duration| {
            TimedEffectSpec::new(EffectKind::StatModifier(StatKey::Attack), 0.1, duration)
                .with_max_stacks(3)
                .from_source(CombatantId(2))
        };

        let first = registry.apply(buff(4.0));
        let second = registry.apply(buff(6.0));

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        let effect = registry.query_all().first().unwrap();
        assert_eq!(effect.duration_remaining, 6.0);
        assert_eq!(effect.stacks, 2);
    }

    #[test]
    fn refresh_never_shortens_duration() {
        let mut registry = EffectRegistry::new();
        registry.apply(poison(2));
        registry.apply(TimedEffectSpec {
            duration: 1.0,
            ..poison(2)
        });

        assert_eq!(registry.query(&EffectKind::DamageOverTime).unwrap().duration_remaining, 5.0);
    }

    #[test]
    fn different_sources_coexist() {
        let mut registry = EffectRegistry::new();
        registry.apply(poison(2));
        registry.apply(poison(3));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.stacks(&EffectKind::DamageOverTime), 2);
        assert!(registry.query_from(&EffectKind::DamageOverTime, CombatantId(3)).is_some());
    }

    #[test]
    fn unique_per_kind_ignores_source() {
        let mut registry = EffectRegistry::new();
        let stun = |source| {
            TimedEffectSpec::new(EffectKind::Stun, 0.0, 1.5)
                .with_stacking(StackingRule::UniquePerKind)
                .from_source(CombatantId(source))
        };
        registry.apply(stun(2));
        registry.apply(stun(3));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.query(&EffectKind::Stun).unwrap().source, CombatantId(3));
    }

    #[test]
    fn stacks_clamp_at_max() {
        let mut registry = EffectRegistry::new();
        let mark = TimedEffectSpec::new(EffectKind::custom("mark"), 1.0, 10.0).with_max_stacks(3);
        for _ in 0..10 {
            registry.apply(mark.clone());
        }
        assert_eq!(registry.stacks(&EffectKind::custom("mark")), 3);
    }

    #[test]
    fn tick_fires_each_interval_before_expiry() {
        let mut registry = EffectRegistry::new();
        registry.apply(poison(2));

        let first = registry.tick(OWNER, 3.0);
        assert_eq!(first.pulses.len(), 1);
        assert!(first.expired.is_empty());

        let second = registry.tick(OWNER, 3.0);
        assert_eq!(second.pulses.len(), 1);
        assert_eq!(second.expired.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn large_dt_catches_up_all_pulses() {
        let mut registry = EffectRegistry::new();
        registry.apply(
            TimedEffectSpec::new(EffectKind::HealOverTime, 5.0, 10.0)
                .ticking(1.0, TickPayload::Heal),
        );

        let report = registry.tick(OWNER, 10.0);
        assert_eq!(report.pulses.len(), 10);
        assert!(report.pulses.iter().all(|p| p.amount == 5.0));
        assert_eq!(report.expired.len(), 1);
    }

    #[test]
    fn expiry_payload_fires_after_final_interval() {
        let mut registry = EffectRegistry::new();
        registry.apply(
            TimedEffectSpec::new(EffectKind::custom("bomb"), 30.0, 2.0)
                .ticking(1.0, TickPayload::Damage)
                .on_expire(TickPayload::Script { hook: 7 }),
        );

        let report = registry.tick(OWNER, 5.0);
        let triggers: Vec<_> = report.pulses.iter().map(|p| p.trigger).collect();
        assert_eq!(
            triggers,
            vec![PulseTrigger::Interval, PulseTrigger::Interval, PulseTrigger::Expiry]
        );
    }

    #[test]
    fn reapply_renews_and_carries_overshoot() {
        let mut registry = EffectRegistry::new();
        registry.apply(
            TimedEffectSpec::new(EffectKind::custom("cycle"), 1.0, 2.0)
                .with_expires(ExpiresAction::Reapply)
                .on_expire(TickPayload::Heal),
        );

        let report = registry.tick(OWNER, 5.0);
        assert_eq!(report.pulses.len(), 2);
        assert!(report.expired.is_empty());
        let effect = registry.query(&EffectKind::custom("cycle")).unwrap();
        assert!((effect.duration_remaining - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_tick_is_noop() {
        let mut registry = EffectRegistry::new();
        registry.apply(poison(2));
        let before = registry.clone();

        assert!(registry.tick(OWNER, 0.0).is_empty());
        assert_eq!(registry, before);
    }

    #[test]
    fn cleanse_removes_only_dispellable_harmful() {
        let mut registry = EffectRegistry::new();
        registry.apply(poison(2));
        registry.apply(
            TimedEffectSpec::new(EffectKind::custom("curse"), 1.0, 5.0)
                .with_tags(EffectTags::HARMFUL),
        );
        registry.apply(TimedEffectSpec::new(EffectKind::Shield, 50.0, 5.0));

        assert_eq!(registry.cleanse_harmful(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.purge_beneficial(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn shields_absorb_oldest_first() {
        let mut registry = EffectRegistry::new();
        registry.apply(TimedEffectSpec::new(EffectKind::Shield, 30.0, 5.0).from_source(CombatantId(2)));
        registry.apply(TimedEffectSpec::new(EffectKind::Shield, 50.0, 5.0).from_source(CombatantId(3)));

        assert_eq!(registry.absorb(40.0), 40.0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.shield_total(), 40.0);

        assert_eq!(registry.absorb(100.0), 40.0);
        assert!(registry.is_empty());
    }

    #[test]
    fn consume_stacks_reports_partial() {
        let mut registry = EffectRegistry::new();
        registry.apply(
            TimedEffectSpec::new(EffectKind::custom("charge"), 1.0, 10.0)
                .with_max_stacks(5)
                .with_stacks(3),
        );

        assert_eq!(registry.consume_stacks(&EffectKind::custom("charge"), 5), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn consume_stacks_from_leaves_other_sources() {
        let mut registry = EffectRegistry::new();
        registry.apply(poison(2).with_max_stacks(5).with_stacks(3));
        registry.apply(poison(3).with_max_stacks(5).with_stacks(2));

        let consumed =
            registry.consume_stacks_from(&EffectKind::DamageOverTime, CombatantId(3), u32::MAX);

        assert_eq!(consumed, 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.stacks(&EffectKind::DamageOverTime), 3);
        assert!(registry.query_from(&EffectKind::DamageOverTime, CombatantId(2)).is_some());
    }

    #[test]
    fn short_reapply_cycle_is_bounded_by_min_interval() {
        let mut registry = EffectRegistry::new();
        registry.apply(
            TimedEffectSpec::new(EffectKind::custom("flicker"), 1.0, 1e-6)
                .with_expires(ExpiresAction::Reapply)
                .on_expire(TickPayload::Heal),
        );

        let report = registry.tick(OWNER, 1.0);
        let bound = (1.0 / EngineConfig::DEFAULT_MIN_TICK_INTERVAL).round() as usize;
        assert!(!report.pulses.is_empty());
        assert!(report.pulses.len() <= bound, "{} pulses", report.pulses.len());
    }

    #[test]
    fn refreshed_shield_is_a_single_pool() {
        let mut registry = EffectRegistry::new();
        let shield = || TimedEffectSpec::new(EffectKind::Shield, 40.0, 5.0).from_source(CombatantId(2));
        registry.apply(shield().with_max_stacks(3));
        registry.apply(shield().with_max_stacks(3));

        let effect = registry.query(&EffectKind::Shield).unwrap();
        assert_eq!(effect.stacks, 1);
        assert_eq!(effect.amount(), registry.shield_total());
        assert_eq!(registry.absorb(100.0), 40.0);
        assert!(registry.is_empty());
    }

    #[test]
    fn drained_shields_leave_positive_zero() {
        let mut registry = EffectRegistry::new();
        registry.apply(TimedEffectSpec::new(EffectKind::Shield, 30.0, 5.0));

        assert_eq!(registry.absorb(50.0), 30.0);
        let total = registry.shield_total();
        assert_eq!(total, 0.0);
        assert!(total.is_sign_positive());
    }

    #[test]
    fn stat_bonus_sums_stacks() {
        let mut registry = EffectRegistry::new();
        registry.apply(
            TimedEffectSpec::new(EffectKind::StatModifier(StatKey::Attack), 0.1, 5.0)
                .with_max_stacks(5)
                .with_stacks(3),
        );
        registry.apply(
            TimedEffectSpec::new(EffectKind::StatModifier(StatKey::Attack), -0.05, 5.0)
                .from_source(CombatantId(9)),
        );

        assert!((registry.stat_bonus(StatKey::Attack) - 0.25).abs() < 1e-9);
        assert_eq!(registry.stat_bonus(StatKey::Defense), 0.0);
    }

    #[test]
    fn zero_duration_insert_is_dropped() {
        let mut registry = EffectRegistry::new();
        assert_eq!(registry.apply(TimedEffectSpec::new(EffectKind::Stun, 0.0, 0.0)), None);
        assert!(registry.is_empty());
    }
}
