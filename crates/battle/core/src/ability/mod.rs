//! Ability metadata and results.
//!
//! - [`AbilityDefinition`]: static, data-driven description of an ability
//!   (cost, cooldown, targeting, payloads, channel timeline)
//! - [`AbilityOutcome`]: immutable per-target result of a cast
//! - [`formula`]: pure magnitude computation

mod definition;
pub mod formula;
mod outcome;

pub use definition::{
    AbilityDefinition, AbilityId, AbilityKind, ChannelSpec, CostMode, DelayedPayload,
    EffectTarget, Payload, ResourceCost, Scaling, TargetRule, TargetingMode, UseCondition,
};
pub use outcome::AbilityOutcome;
