use std::collections::BTreeMap;
use std::sync::Arc;

use battle_core::AbilityKit;

use super::{KitDefinition, ScriptedKit};

/// Kits by name.
#[derive(Clone, Debug, Default)]
pub struct KitRegistry {
    kits: BTreeMap<String, Arc<ScriptedKit>>,
}

impl KitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a kit, replacing any kit with the same name.
    pub fn insert(&mut self, definition: KitDefinition) -> Result<(), String> {
        definition
            .validate()
            .map_err(|e| format!("kit '{}': {e}", definition.name))?;
        tracing::debug!(
            kit = %definition.name,
            abilities = definition.abilities.len(),
            "kit registered"
        );
        self.kits
            .insert(definition.name.clone(), Arc::new(ScriptedKit::new(definition)));
        Ok(())
    }

    /// Shared handle suitable for `BattleEngine::register`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn AbilityKit>> {
        self.kits
            .get(name)
            .map(|kit| Arc::clone(kit) as Arc<dyn AbilityKit>)
    }

    pub fn definition(&self, name: &str) -> Option<&KitDefinition> {
        self.kits.get(name).map(|kit| kit.definition())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.kits.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.kits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kits.is_empty()
    }
}
