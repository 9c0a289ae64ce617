//! Errors surfaced by the reference runner.
use battle_core::{CombatantId, EngineError, ErrorSeverity};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runner config field {field} must be positive and finite, got {value}")]
    InvalidConfig { field: &'static str, value: f64 },

    #[error("battle has no combatants")]
    EmptyRoster,

    #[error("combatant {0} is already in the battle")]
    DuplicateCombatant(CombatantId),

    /// The engine clock produced no time (paused or zero speed).
    #[error("battle clock stalled at {now:.2}s")]
    Stalled { now: f64 },

    #[error("failed to encode battle state")]
    Encode(#[from] bincode::Error),
}

impl EngineError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidConfig { .. } | Self::EmptyRoster | Self::DuplicateCombatant(_) => {
                ErrorSeverity::Validation
            }
            Self::Stalled { .. } => ErrorSeverity::Recoverable,
            Self::Encode(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "RUNTIME_INVALID_CONFIG",
            Self::EmptyRoster => "RUNTIME_EMPTY_ROSTER",
            Self::DuplicateCombatant(_) => "RUNTIME_DUPLICATE_COMBATANT",
            Self::Stalled { .. } => "RUNTIME_STALLED",
            Self::Encode(_) => "RUNTIME_ENCODE",
        }
    }
}
