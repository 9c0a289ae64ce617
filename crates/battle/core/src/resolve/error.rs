//! Cast rejection errors.
//!
//! Every variant is raised before the cast commits: a rejected cast never
//! spends resources, starts cooldowns or touches targets.

use crate::ability::AbilityId;
use crate::error::{EngineError, ErrorSeverity};
use crate::state::{CombatantId, Seconds};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("actor {0} is not registered")]
    ActorNotFound(CombatantId),

    #[error("actor {0} is dead or removed")]
    ActorDead(CombatantId),

    #[error("actor {0} is stunned")]
    Stunned(CombatantId),

    /// Silenced actors may only use basic attacks.
    #[error("actor {actor} is silenced and cannot use {ability}")]
    Silenced {
        actor: CombatantId,
        ability: AbilityId,
    },

    #[error("ability {0} is not castable by this actor")]
    UnknownAbility(AbilityId),

    #[error("ability {ability} is on cooldown ({remaining:.2}s left)")]
    OnCooldown {
        ability: AbilityId,
        remaining: Seconds,
    },

    /// A hard cost exceeds what the actor has.
    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientResource {
        resource: String,
        required: f64,
        available: f64,
    },

    #[error("actor {0} is already channeling")]
    ChannelInProgress(CombatantId),

    /// Every requested target was dead or missing.
    #[error("no valid targets for {0}")]
    NoValidTargets(AbilityId),
}

impl EngineError for ResolveError {
    fn severity(&self) -> ErrorSeverity {
        use ResolveError::*;
        match self {
            ActorNotFound(_) | UnknownAbility(_) => ErrorSeverity::Validation,
            ActorDead(_) | Stunned(_) | Silenced { .. } => ErrorSeverity::Recoverable,
            OnCooldown { .. } | InsufficientResource { .. } | ChannelInProgress(_) => {
                ErrorSeverity::Recoverable
            }
            NoValidTargets(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        use ResolveError::*;
        match self {
            ActorNotFound(_) => "RESOLVE_ACTOR_NOT_FOUND",
            ActorDead(_) => "RESOLVE_ACTOR_DEAD",
            Stunned(_) => "RESOLVE_STUNNED",
            Silenced { .. } => "RESOLVE_SILENCED",
            UnknownAbility(_) => "RESOLVE_UNKNOWN_ABILITY",
            OnCooldown { .. } => "RESOLVE_ON_COOLDOWN",
            InsufficientResource { .. } => "RESOLVE_INSUFFICIENT_RESOURCE",
            ChannelInProgress(_) => "RESOLVE_CHANNEL_IN_PROGRESS",
            NoValidTargets(_) => "RESOLVE_NO_VALID_TARGETS",
        }
    }
}
