//! Data-driven character kits and configuration loaders.
//!
//! This crate houses sample content and the loaders for it:
//! - Kit definitions: abilities, resources, passives, script hooks (RON)
//! - Engine and runner configuration (TOML)
//!
//! [`ScriptedKit`] turns a [`KitDefinition`] into a `battle_core::AbilityKit`,
//! so adding a character needs data only.

pub mod kit;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use kit::{KitDefinition, KitRegistry, PassiveSpec, ScriptAction, ScriptRule, ScriptedKit};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, KitLoader, LoadResult};
