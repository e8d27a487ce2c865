//! Configuration management for charm-pip

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Command used to invoke the package installer
    pub pip_command: String,

    /// Command used to materialize virtual environments
    pub virtualenv_command: String,

    /// Command used to invoke the OS package manager
    pub apt_command: String,

    /// Host package that provides the installer tool
    pub pip_package: String,

    /// Host package that provides the virtualenv tool
    pub virtualenv_package: String,

    /// Working directory of the deployment (CHARM_DIR)
    pub charm_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pip_command: "pip3".to_string(),
            virtualenv_command: "virtualenv".to_string(),
            apt_command: "apt-get".to_string(),
            pip_package: "python3-pip".to_string(),
            virtualenv_package: "python3-virtualenv".to_string(),
            charm_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from the environment or use defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("CHARM_DIR") {
            if !dir.is_empty() {
                config.charm_dir = PathBuf::from(dir);
            }
        }
        if let Ok(command) = env::var("CHARM_PIP_COMMAND") {
            if !command.is_empty() {
                config.pip_command = command;
            }
        }
        if let Ok(command) = env::var("CHARM_PIP_VIRTUALENV") {
            if !command.is_empty() {
                config.virtualenv_command = command;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::EnvGuard;
    use crate::test::ENV_LOCK;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pip_command, "pip3");
        assert_eq!(config.virtualenv_command, "virtualenv");
        assert_eq!(config.apt_command, "apt-get");
        assert_eq!(config.pip_package, "python3-pip");
        assert_eq!(config.virtualenv_package, "python3-virtualenv");
        assert_eq!(config.charm_dir, PathBuf::from("."));
    }

    #[test]
    fn test_load_applies_environment_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _charm_dir = EnvGuard::set("CHARM_DIR", "/var/lib/juju/agents/unit-app-0/charm");
        let _pip = EnvGuard::set("CHARM_PIP_COMMAND", "pip3.12");
        let _virtualenv = EnvGuard::clear("CHARM_PIP_VIRTUALENV");

        let config = Config::load();
        assert_eq!(
            config.charm_dir,
            PathBuf::from("/var/lib/juju/agents/unit-app-0/charm")
        );
        assert_eq!(config.pip_command, "pip3.12");
        // Untouched fields keep their defaults
        assert_eq!(config.virtualenv_command, "virtualenv");
    }

    #[test]
    fn test_load_ignores_empty_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _charm_dir = EnvGuard::set("CHARM_DIR", "");
        let _pip = EnvGuard::clear("CHARM_PIP_COMMAND");

        let config = Config::load();
        assert_eq!(config.charm_dir, PathBuf::from("."));
        assert_eq!(config.pip_command, "pip3");
    }
}
