//! Magnitude computation.
//!
//! Pure functions of their inputs: an actor's effective stat and the amount
//! of resource the cast consumed. No battle state is read here.

use super::Scaling;

/// Applies engine-side fractional modifiers to a base stat.
///
/// `bonus` is the sum of `StatModifier` effects; the multiplier never drops
/// below zero.
pub fn effective_stat(base: f64, bonus: f64) -> f64 {
    let base = if base.is_finite() { base } else { 0.0 };
    let bonus = if bonus.is_finite() { bonus } else { 0.0 };
    base * (1.0 + bonus).max(0.0)
}

/// `stat × ratio + flat + consumed × per_consumed`, floored at zero.
pub fn magnitude(scaling: &Scaling, stat_value: f64, consumed: f64) -> f64 {
    let value = stat_value * scaling.ratio + scaling.flat + consumed * scaling.per_consumed;
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
