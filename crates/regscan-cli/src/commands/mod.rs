//! Subcommand implementations

pub mod config;
pub mod scan;

use std::path::Path;

use anyhow::Context;
use regscan_core::ScanConfig;

/// Defaults, or the given file merged over them
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ScanConfig> {
    match path {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ScanConfig::default()),
    }
}
