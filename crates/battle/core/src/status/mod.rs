//! Effect Registry: stacking, decaying timed effects attached to combatants.
//!
//! Buffs, debuffs, damage/heal over time, shields and crowd control all share
//! one representation, [`TimedEffect`], created from a [`TimedEffectSpec`]
//! and advanced exclusively by [`EffectRegistry::tick`].

mod effect;
mod kind;
mod registry;

pub use effect::{EffectHandle, TimedEffect, TimedEffectSpec};
pub use kind::{EffectKind, EffectTags, ExpiresAction, StackingRule, TickPayload};
pub use registry::{EffectPulse, EffectRegistry, EffectTickReport, PulseTrigger};
