//! Reference host for the battle engine.
//!
//! Wires `battle-core` to a minimal combatant model and a fixed-step
//! scheduler so kits can be exercised end to end:
//! - [`sim`]: `Combatant`/`Arena` implementations with simple mitigation
//! - [`runner`]: the scheduling loop and battle report
//! - [`events`]: topic-based broadcast bus and a bus-backed `Presenter`
//! - [`digest`]: state digests for replay checks
pub mod config;
pub mod digest;
pub mod error;
pub mod events;
pub mod runner;
pub mod sim;

pub use config::RunnerConfig;
pub use error::{Result, RuntimeError};
pub use events::{BusPresenter, CombatEvent, Event, EventBus, PresentationEvent, Topic};
pub use runner::{BattleReport, BattleRunner};
pub use sim::{SimArena, SimCombatant};
