//! Configuration loader.
//!
//! One TOML file holds a table per consumer (`[engine]` for the core
//! engine, `[runner]` for the reference scheduler). Each consumer reads its
//! own section; a missing section falls back to the type's defaults.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::loaders::{LoadResult, read_file};

/// Sample configuration compiled into the crate.
const BUILTIN_CONFIG: &str = include_str!("../../data/config/battle.toml");

/// Loader for configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a whole TOML file as `T`.
    pub fn load<T: DeserializeOwned>(path: &Path) -> LoadResult<T> {
        let content = read_file(path)?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML {}: {}", path.display(), e))
    }

    /// Load the `[section]` table of a TOML file as `T`.
    pub fn load_section<T>(path: &Path, section: &str) -> LoadResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let content = read_file(path)?;
        Self::parse_section(&content, section)
    }

    /// Parse the `[section]` table of TOML source as `T`.
    pub fn parse_section<T>(content: &str, section: &str) -> LoadResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let mut table: toml::Table = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        match table.remove(section) {
            Some(value) => value
                .try_into()
                .map_err(|e| anyhow::anyhow!("Invalid [{}] config: {}", section, e)),
            None => {
                tracing::debug!(section, "config section missing, using defaults");
                Ok(T::default())
            }
        }
    }

    /// The `[section]` table of the embedded sample configuration.
    pub fn builtin_section<T>(section: &str) -> LoadResult<T>
    where
        T: DeserializeOwned + Default,
    {
        Self::parse_section(BUILTIN_CONFIG, section)
    }
}
