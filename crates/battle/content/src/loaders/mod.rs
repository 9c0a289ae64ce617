//! Content loaders for reading kit and configuration files.
//!
//! Kits are authored in RON, configuration in TOML. Sample data ships
//! embedded in the crate so demos and tests need no files on disk.

pub mod config;
pub mod kit;

pub use config::ConfigLoader;
pub use kit::KitLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
