//! Isolated virtual environment creation

use crate::apt;
use crate::config::Config;
use crate::runner;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Directory name used when no explicit path is given
const DEFAULT_VENV_DIR: &str = "venv";

/// Create an isolated Python environment.
///
/// Without an explicit `path` the environment lands under the charm
/// directory. Creation happens once per path: when the target directory
/// already exists the call is a no-op and returns the existing location.
pub fn create_virtualenv(config: &Config, path: Option<&Path>) -> Result<PathBuf> {
    let venv_path = resolve_path(config, path);

    if venv_path.exists() {
        debug!(
            "Virtualenv {} already exists, skipping creation",
            venv_path.display()
        );
        return Ok(venv_path);
    }

    if !runner::is_executable_available(&config.virtualenv_command, &[]) {
        apt::install(&config.apt_command, &[&config.virtualenv_package])?;
    }

    let args = vec![venv_path.display().to_string()];
    info!(
        "Creating virtualenv with command: {}",
        runner::render_command(&config.virtualenv_command, &args)
    );
    runner::run(&config.virtualenv_command, &args, &[])
        .with_context(|| format!("Failed to create virtualenv at {}", venv_path.display()))?;

    Ok(venv_path)
}

fn resolve_path(config: &Config, path: Option<&Path>) -> PathBuf {
    match path {
        Some(path) => path.to_path_buf(),
        None => config.charm_dir.join(DEFAULT_VENV_DIR),
    }
}
