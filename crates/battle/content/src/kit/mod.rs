//! Data-driven character kits.

mod definition;
mod registry;
mod scripted;

pub use definition::{KitDefinition, PassiveSpec, ScriptAction, ScriptRule};
pub use registry::KitRegistry;
pub use scripted::ScriptedKit;
