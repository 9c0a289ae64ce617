//! Kit loader.

use std::path::Path;

use crate::kit::{KitDefinition, KitRegistry};
use crate::loaders::{LoadResult, read_file};

/// Sample kits compiled into the crate, as `(file name, RON source)`.
const BUILTIN_KITS: &[(&str, &str)] = &[
    ("vanguard.ron", include_str!("../../data/kits/vanguard.ron")),
    ("pyromancer.ron", include_str!("../../data/kits/pyromancer.ron")),
    ("cleric.ron", include_str!("../../data/kits/cleric.ron")),
];

/// Loader for kit definitions from RON files.
pub struct KitLoader;

impl KitLoader {
    /// Load one kit from a RON file.
    ///
    /// RON format: a single `KitDefinition`.
    pub fn load(path: &Path) -> LoadResult<KitDefinition> {
        let content = read_file(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse and validate a kit from RON source. `origin` names the source in
    /// error messages.
    pub fn parse(content: &str, origin: &str) -> LoadResult<KitDefinition> {
        let kit: KitDefinition = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse kit RON at {}: {}", origin, e))?;
        kit.validate()
            .map_err(|e| anyhow::anyhow!("Invalid kit '{}' at {}: {}", kit.name, origin, e))?;
        Ok(kit)
    }

    /// Load every `*.ron` file in `dir` into a registry.
    ///
    /// Files are read in name order so later files win on name clashes
    /// deterministically.
    pub fn load_dir(dir: &Path) -> LoadResult<KitRegistry> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to read kit directory {}: {}", dir.display(), e))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut registry = KitRegistry::new();
        for path in paths {
            let kit = Self::load(&path)?;
            registry.insert(kit).map_err(anyhow::Error::msg)?;
        }
        Ok(registry)
    }

    /// Registry of the sample kits embedded in this crate.
    pub fn builtin() -> LoadResult<KitRegistry> {
        let mut registry = KitRegistry::new();
        for (name, source) in BUILTIN_KITS {
            let kit = Self::parse(source, name)?;
            registry.insert(kit).map_err(anyhow::Error::msg)?;
        }
        Ok(registry)
    }
}
