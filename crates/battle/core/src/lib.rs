//! Status-effect and resource-economy engine for real-time auto-battlers.
//!
//! `battle-core` gives per-character ability scripts deterministic semantics
//! for timed effects, named resources, cooldowns, channels and delayed
//! payloads, all driven by one simulated clock. Combatant HP, stats and
//! presentation stay with the host and are reached through the
//! [`Combatant`], [`Arena`] and [`Presenter`] traits. All time advances
//! through [`engine::BattleEngine::advance`].
pub mod ability;
pub mod clock;
pub mod combatant;
pub mod config;
pub mod cooldown;
pub mod decision;
pub mod engine;
pub mod error;
pub mod kit;
pub mod resolve;
pub mod resources;
pub mod rng;
pub mod state;
pub mod status;
pub mod timeline;

pub use ability::{
    AbilityDefinition, AbilityId, AbilityKind, AbilityOutcome, ChannelSpec, CostMode,
    DelayedPayload, EffectTarget, Payload, ResourceCost, Scaling, TargetRule, TargetingMode,
    UseCondition,
};
pub use clock::Clock;
pub use combatant::{
    ActionReceipt, ActionRequest, Arena, Combatant, CombatantView, Element, NullPresenter,
    OutcomeKind, Presenter, StatKey, TextStyle,
};
pub use config::EngineConfig;
pub use cooldown::CooldownTable;
pub use decision::{Decision, DecisionContext};
pub use engine::{ActionReport, BattleEngine, TickSummary};
pub use error::{EngineError, ErrorSeverity};
pub use kit::{AbilityKit, KitTable, PassiveContext, ScriptInvocation, ScriptTrigger};
pub use resolve::{ActionContext, ChannelPhase, ChannelState, ResolveError};
pub use resources::{DecayRule, Resource, ResourceDeclaration, ResourceLedger};
pub use rng::{PcgRng, RngOracle, compute_seed};
pub use state::{BattleState, CombatantId, CombatantState, Position, Seconds, Team};
pub use status::{
    EffectHandle, EffectKind, EffectPulse, EffectRegistry, EffectTags, EffectTickReport,
    ExpiresAction, PulseTrigger, StackingRule, TickPayload, TimedEffect, TimedEffectSpec,
};
pub use timeline::{ScheduledAction, Timeline};
