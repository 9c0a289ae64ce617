use crate::combatant::{ActionReceipt, OutcomeKind};
use crate::state::CombatantId;

/// Immutable record of one damage/heal/shield result, returned to the caller
/// for presentation and telemetry.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityOutcome {
    target: CombatantId,
    amount: f64,
    kind: OutcomeKind,
    was_evaded: bool,
    was_critical: bool,
}

impl AbilityOutcome {
    pub fn new(
        target: CombatantId,
        amount: f64,
        kind: OutcomeKind,
        was_evaded: bool,
        was_critical: bool,
    ) -> Self {
        Self {
            target,
            amount,
            kind,
            was_evaded,
            was_critical,
        }
    }

    pub fn from_receipt(target: CombatantId, kind: OutcomeKind, receipt: ActionReceipt) -> Self {
        Self::new(
            target,
            receipt.amount,
            kind,
            receipt.was_evaded,
            receipt.was_critical,
        )
    }

    pub fn target(&self) -> CombatantId {
        self.target
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    pub fn was_evaded(&self) -> bool {
        self.was_evaded
    }

    pub fn was_critical(&self) -> bool {
        self.was_critical
    }
}
