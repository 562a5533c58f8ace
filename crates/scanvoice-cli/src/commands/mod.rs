//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;
mod report;

use std::path::{Path, PathBuf};

use scanvoice_core::ScanConfig;
use tracing::debug;

/// Platform configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scanvoice")
        .join("config.json")
}

/// Configuration from `--config`, else the default file, else built-in defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<ScanConfig> {
    if let Some(path) = path {
        return Ok(ScanConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading configuration from {}", default_path.display());
        Ok(ScanConfig::from_file(&default_path)?)
    } else {
        Ok(ScanConfig::default())
    }
}
