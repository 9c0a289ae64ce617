//! Deterministic target selection.
//!
//! Every ordering ends with the combatant id, so ties never depend on the
//! order candidates were supplied in.

use std::cmp::Ordering;

use crate::ability::TargetRule;
use crate::combatant::CombatantView;
use crate::rng::RngOracle;
use crate::state::CombatantId;

/// Lowest HP fraction, then nearest, then lowest id.
pub fn by_lowest_hp(origin: &CombatantView, a: &CombatantView, b: &CombatantView) -> Ordering {
    a.hp_fraction()
        .total_cmp(&b.hp_fraction())
        .then_with(|| origin.distance_to(a).total_cmp(&origin.distance_to(b)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Nearest, then lowest HP fraction, then lowest id.
pub fn by_nearest(origin: &CombatantView, a: &CombatantView, b: &CombatantView) -> Ordering {
    origin
        .distance_to(a)
        .total_cmp(&origin.distance_to(b))
        .then_with(|| a.hp_fraction().total_cmp(&b.hp_fraction()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Highest current HP, then nearest, then lowest id.
pub fn by_highest_hp(origin: &CombatantView, a: &CombatantView, b: &CombatantView) -> Ordering {
    b.hp.total_cmp(&a.hp)
        .then_with(|| origin.distance_to(a).total_cmp(&origin.distance_to(b)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Picks one candidate according to `rule`.
pub fn pick(
    rule: TargetRule,
    origin: &CombatantView,
    candidates: &[CombatantView],
    rng: &dyn RngOracle,
    seed: u64,
) -> Option<CombatantId> {
    match rule {
        TargetRule::LowestHp => candidates
            .iter()
            .min_by(|a, b| by_lowest_hp(origin, a, b))
            .map(|c| c.id),
        TargetRule::Nearest => candidates
            .iter()
            .min_by(|a, b| by_nearest(origin, a, b))
            .map(|c| c.id),
        TargetRule::HighestHp => candidates
            .iter()
            .min_by(|a, b| by_highest_hp(origin, a, b))
            .map(|c| c.id),
        TargetRule::Random => {
            let mut ids: Vec<CombatantId> = candidates.iter().map(|c| c.id).collect();
            ids.sort();
            rng.pick_index(seed, ids.len()).map(|idx| ids[idx])
        }
    }
}

/// Number of candidates within `radius` of `center` (including itself).
pub fn cluster_size(center: &CombatantView, candidates: &[CombatantView], radius: f64) -> usize {
    candidates
        .iter()
        .filter(|c| center.distance_to(c) <= radius)
        .count()
}

/// The densest cluster: the candidate with the most neighbours within
/// `radius`, and those neighbours ordered nearest-first with the centre
/// leading.
///
/// Ties between centres prefer lowest HP fraction, then proximity to
/// `origin`, then lowest id.
pub fn densest_cluster(
    origin: &CombatantView,
    candidates: &[CombatantView],
    radius: f64,
) -> Vec<CombatantId> {
    let center = candidates.iter().min_by(|a, b| {
        cluster_size(b, candidates, radius)
            .cmp(&cluster_size(a, candidates, radius))
            .then_with(|| by_lowest_hp(origin, a, b))
    });
    let Some(center) = center else {
        return Vec::new();
    };

    let mut members: Vec<&CombatantView> = candidates
        .iter()
        .filter(|c| center.distance_to(c) <= radius)
        .collect();
    members.sort_by(|a, b| by_nearest(center, a, b));
    members.into_iter().map(|c| c.id).collect()
}
