//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod process;

use std::path::Path;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use invox_core::models::config::InvoxConfig;

/// Load the configuration named by `-c`, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvoxConfig> {
    if let Some(path) = config_path {
        return InvoxConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {}", path));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        InvoxConfig::from_file(&default_path)
            .with_context(|| format!("Failed to read config file {}", default_path.display()))
    } else {
        Ok(InvoxConfig::default())
    }
}

/// Spinner fed by job progress messages.
pub fn spinner() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}
