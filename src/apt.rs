//! OS package manager collaborator
//!
//! Used to make sure the installer and virtualenv tools themselves are
//! present on the host before use. Every invocation is non-interactive;
//! failures propagate to the caller unretried.

use crate::runner;
use anyhow::{Context, Result};
use log::info;

/// Environment forced onto every package manager invocation
const APT_ENV: [(&str, &str); 1] = [("DEBIAN_FRONTEND", "noninteractive")];

/// Refresh the host package indexes
pub fn update(apt_command: &str) -> Result<()> {
    let args = vec!["update".to_string(), "-q".to_string()];
    info!(
        "Updating package indexes with command: {}",
        runner::render_command(apt_command, &args)
    );
    runner::run(apt_command, &args, &APT_ENV).context("Failed to update package indexes")?;
    Ok(())
}

/// Install host packages, assuming yes to all prompts
pub fn install(apt_command: &str, packages: &[&str]) -> Result<()> {
    let args = install_args(packages);
    info!(
        "Installing host packages {:?} with command: {}",
        packages,
        runner::render_command(apt_command, &args)
    );
    runner::run(apt_command, &args, &APT_ENV)
        .with_context(|| format!("Failed to install host packages {:?}", packages))?;
    Ok(())
}

fn install_args(packages: &[&str]) -> Vec<String> {
    let mut args = vec!["install".to_string(), "-y".to_string(), "-q".to_string()];
    args.extend(packages.iter().map(|package| package.to_string()));
    args
}
