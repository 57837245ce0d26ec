pub mod analyze;
pub mod config;
pub mod info;
pub mod reduce;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dorado_core::pipeline::config::ReductionConfig;

/// Load a TOML reduction config, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<ReductionConfig> {
    let Some(path) = path else {
        return Ok(ReductionConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).context("Invalid reduction config")
}

/// Bare file names of `paths`, for a store rooted at their directory.
pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect()
}
