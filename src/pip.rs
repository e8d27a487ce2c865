//! Package installer operations
//!
//! Assembles pip command lines from requests, logs the full command, and
//! executes it blocking. Each operation declares its own allow-list of
//! recognized installer options; failures of the external tool propagate
//! to the caller unretried.

use crate::apt;
use crate::config::Config;
use crate::options::{format_flags, OptionMap};
use crate::runner::{self, EnvGuard};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options recognized by package installs
const INSTALL_OPTIONS: [&str; 4] = ["proxy", "src", "log", "index-url"];

/// Options recognized by requirements-file installs
const REQUIREMENTS_OPTIONS: [&str; 3] = ["proxy", "src", "log"];

/// Options recognized by uninstalls
const UNINSTALL_OPTIONS: [&str; 2] = ["proxy", "log"];

/// Interpreter path variables kept away from installer child processes
const SCRUBBED_ENV_VARS: [&str; 2] = ["PYTHONPATH", "PYTHONHOME"];

/// A request to install one or more packages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallRequest {
    /// Packages to install
    pub packages: Vec<String>,

    /// Pass --upgrade to the installer
    pub upgrade: bool,

    /// Install into this virtual environment instead of the host interpreter
    pub venv: Option<PathBuf>,

    /// Extra installer options, filtered against the install allow-list
    pub options: OptionMap,
}

impl InstallRequest {
    /// Request installation of a single package
    pub fn package(name: &str) -> Self {
        Self {
            packages: vec![name.to_string()],
            ..Self::default()
        }
    }
}

/// An installed package as reported by the installer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

/// Client for the host package installer
pub struct PipClient {
    config: Config,
}

impl PipClient {
    /// Create a client with configuration loaded from the environment
    pub fn new() -> Self {
        Self {
            config: Config::load(),
        }
    }

    /// Create a client with explicit configuration
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Install one or more packages
    pub fn install(&self, request: &InstallRequest) -> Result<()> {
        let args = build_install_args(request);

        match &request.venv {
            Some(venv) => {
                // A virtualenv ships its own installer; host pip is not needed.
                let pip = venv.join("bin/pip");
                let pip = pip.to_string_lossy();
                info!(
                    "Installing {:?} with command: {}",
                    request.packages,
                    runner::render_command(&pip, &args)
                );
                runner::run(&pip, &args, &[])
                    .with_context(|| format!("Failed to install {:?}", request.packages))?;
            }
            None => {
                info!(
                    "Installing {:?} with command: {}",
                    request.packages,
                    runner::render_command(&self.config.pip_command, &args)
                );
                self.ensure_pip()?;
                let _scrubbed = scrub_interpreter_env();
                runner::run(&self.config.pip_command, &args, &[])
                    .with_context(|| format!("Failed to install {:?}", request.packages))?;
            }
        }
        Ok(())
    }

    /// Install from a requirements file, optionally pinned by a constraints file
    pub fn install_requirements(
        &self,
        requirements: &Path,
        constraints: Option<&Path>,
        options: &OptionMap,
    ) -> Result<()> {
        let args = build_requirements_args(requirements, constraints, options);

        match constraints {
            Some(constraints) => info!(
                "Installing from file: {} with constraints {} and command: {}",
                requirements.display(),
                constraints.display(),
                runner::render_command(&self.config.pip_command, &args)
            ),
            None => info!(
                "Installing from file: {} with command: {}",
                requirements.display(),
                runner::render_command(&self.config.pip_command, &args)
            ),
        }

        self.ensure_pip()?;
        let _scrubbed = scrub_interpreter_env();
        runner::run(&self.config.pip_command, &args, &[])
            .with_context(|| format!("Failed to install from {}", requirements.display()))?;
        Ok(())
    }

    /// Uninstall one or more packages
    pub fn uninstall(&self, packages: &[String], options: &OptionMap) -> Result<()> {
        let args = build_uninstall_args(packages, options);
        info!(
            "Uninstalling {:?} with command: {}",
            packages,
            runner::render_command(&self.config.pip_command, &args)
        );

        self.ensure_pip()?;
        let _scrubbed = scrub_interpreter_env();
        runner::run(&self.config.pip_command, &args, &[])
            .with_context(|| format!("Failed to uninstall {:?}", packages))?;
        Ok(())
    }

    /// List installed packages.
    ///
    /// Asks the installer for JSON output first and falls back to parsing
    /// the columnar listing on older tools.
    pub fn list(&self) -> Result<Vec<PackageInfo>> {
        self.ensure_pip()?;
        let _scrubbed = scrub_interpreter_env();

        let json_args = vec!["list".to_string(), "--format=json".to_string()];
        match runner::run(&self.config.pip_command, &json_args, &[]) {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                parse_list_json(&stdout)
            }
            Err(e) => {
                debug!("JSON listing failed: {}, falling back to plain output", e);
                let output = runner::run(&self.config.pip_command, &["list".to_string()], &[])
                    .context("Failed to list packages")?;
                let stdout = String::from_utf8_lossy(&output.stdout);
                Ok(parse_list_columns(&stdout))
            }
        }
    }

    /// Create an isolated environment for subsequent venv-aware installs
    pub fn create_virtualenv(&self, path: Option<&Path>) -> Result<PathBuf> {
        crate::venv::create_virtualenv(&self.config, path)
    }

    /// Make sure the installer tool is present, installing it through the OS
    /// package manager at most once.
    fn ensure_pip(&self) -> Result<()> {
        if runner::is_executable_available(&self.config.pip_command, &[]) {
            return Ok(());
        }

        debug!(
            "{} not found, installing {}",
            self.config.pip_command, self.config.pip_package
        );
        apt::update(&self.config.apt_command)?;
        apt::install(&self.config.apt_command, &[&self.config.pip_package])?;

        if runner::is_executable_available(&self.config.pip_command, &[]) {
            return Ok(());
        }
        bail!(
            "{} is still unavailable after installing {}",
            self.config.pip_command,
            self.config.pip_package
        );
    }
}

/// Clear interpreter path variables for the duration of an installer call.
///
/// The guards restore the previous values when dropped, so the hook
/// environment is identical on every exit path.
fn scrub_interpreter_env() -> Vec<EnvGuard> {
    SCRUBBED_ENV_VARS
        .iter()
        .map(|var| EnvGuard::clear(var))
        .collect()
}

/// Assemble the argument vector for an install request
fn build_install_args(request: &InstallRequest) -> Vec<String> {
    let mut args = vec!["install".to_string()];
    args.extend(format_flags(&request.options, &INSTALL_OPTIONS));
    if request.upgrade {
        args.push("--upgrade".to_string());
    }
    args.extend(request.packages.iter().cloned());
    args
}

/// Assemble the argument vector for a requirements-file install
fn build_requirements_args(
    requirements: &Path,
    constraints: Option<&Path>,
    options: &OptionMap,
) -> Vec<String> {
    let mut args = vec!["install".to_string()];
    args.extend(format_flags(options, &REQUIREMENTS_OPTIONS));
    args.push("-r".to_string());
    args.push(requirements.display().to_string());
    if let Some(constraints) = constraints {
        args.push("-c".to_string());
        args.push(constraints.display().to_string());
    }
    args
}

/// Assemble the argument vector for an uninstall
fn build_uninstall_args(packages: &[String], options: &OptionMap) -> Vec<String> {
    let mut args = vec![
        "uninstall".to_string(),
        "-q".to_string(),
        "-y".to_string(),
    ];
    args.extend(format_flags(options, &UNINSTALL_OPTIONS));
    args.extend(packages.iter().cloned());
    args
}

/// Parse `pip list --format=json` output
fn parse_list_json(stdout: &str) -> Result<Vec<PackageInfo>> {
    serde_json::from_str(stdout.trim()).context("Failed to parse installer JSON output")
}

/// Parse the two-column plain `pip list` output, skipping header and rule lines
fn parse_list_columns(stdout: &str) -> Vec<PackageInfo> {
    let mut packages = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("Package") || line.starts_with('-') {
            continue;
        }

        let mut parts = line.split_whitespace();
        if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
            // Legacy listings wrap the version in parentheses
            let version = version.trim_start_matches('(').trim_end_matches(')');
            packages.push(PackageInfo {
                name: name.to_string(),
                version: version.to_string(),
            });
        }
    }

    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_install_single_package() {
        let request = InstallRequest::package("foo");
        assert_eq!(build_install_args(&request), vec!["install", "foo"]);
    }

    #[test]
    fn test_install_many_with_upgrade() {
        let request = InstallRequest {
            packages: vec!["foo".to_string(), "bar".to_string()],
            upgrade: true,
            ..InstallRequest::default()
        };
        assert_eq!(
            build_install_args(&request),
            vec!["install", "--upgrade", "foo", "bar"]
        );
    }

    #[test]
    fn test_install_flags_precede_packages_in_name_order() {
        let request = InstallRequest {
            packages: vec!["foo".to_string()],
            options: options(&[
                ("proxy", "http://squid:3128"),
                ("index-url", "http://pypi.internal/simple"),
            ]),
            ..InstallRequest::default()
        };
        assert_eq!(
            build_install_args(&request),
            vec![
                "install",
                "--index-url=http://pypi.internal/simple",
                "--proxy=http://squid:3128",
                "foo",
            ]
        );
    }

    #[test]
    fn test_install_drops_unrecognized_options() {
        let request = InstallRequest {
            packages: vec!["foo".to_string()],
            options: options(&[("color", "always"), ("proxy", "")]),
            ..InstallRequest::default()
        };
        assert_eq!(build_install_args(&request), vec!["install", "foo"]);
    }

    #[test]
    fn test_uninstall_is_quiet_and_assumes_yes() {
        let packages = vec!["foo".to_string()];
        assert_eq!(
            build_uninstall_args(&packages, &OptionMap::new()),
            vec!["uninstall", "-q", "-y", "foo"]
        );
    }

    #[test]
    fn test_uninstall_does_not_recognize_index_url() {
        let packages = vec!["foo".to_string()];
        let given = options(&[
            ("index-url", "http://pypi.internal/simple"),
            ("log", "/tmp/pip.log"),
        ]);
        assert_eq!(
            build_uninstall_args(&packages, &given),
            vec!["uninstall", "-q", "-y", "--log=/tmp/pip.log", "foo"]
        );
    }

    #[test]
    fn test_requirements_without_constraints() {
        let args = build_requirements_args(
            Path::new("/srv/app/requirements.txt"),
            None,
            &OptionMap::new(),
        );
        assert_eq!(args, vec!["install", "-r", "/srv/app/requirements.txt"]);
    }

    #[test]
    fn test_requirements_with_constraints_and_options() {
        let given = options(&[("src", "/srv/src"), ("proxy", "http://squid:3128")]);
        let args = build_requirements_args(
            Path::new("/srv/app/requirements.txt"),
            Some(Path::new("/srv/app/constraints.txt")),
            &given,
        );
        assert_eq!(
            args,
            vec![
                "install",
                "--proxy=http://squid:3128",
                "--src=/srv/src",
                "-r",
                "/srv/app/requirements.txt",
                "-c",
                "/srv/app/constraints.txt",
            ]
        );
    }

    #[test]
    fn test_parse_list_json() {
        let stdout = r#"[{"name": "pyyaml", "version": "6.0.1"}, {"name": "six", "version": "1.16.0"}]"#;
        let packages = parse_list_json(stdout).unwrap();
        assert_eq!(
            packages,
            vec![
                PackageInfo {
                    name: "pyyaml".to_string(),
                    version: "6.0.1".to_string(),
                },
                PackageInfo {
                    name: "six".to_string(),
                    version: "1.16.0".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_list_json_rejects_garbage() {
        assert!(parse_list_json("WARNING: not json").is_err());
    }

    #[test]
    fn test_parse_list_columns() {
        let stdout = "Package    Version\n---------- -------\npyyaml     6.0.1\nsix        1.16.0\n";
        let packages = parse_list_columns(stdout);
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "pyyaml");
        assert_eq!(packages[0].version, "6.0.1");
    }

    #[test]
    fn test_parse_list_columns_legacy_format() {
        let stdout = "pyyaml (6.0.1)\nsix (1.16.0)\n";
        let packages = parse_list_columns(stdout);
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[1].name, "six");
        assert_eq!(packages[1].version, "1.16.0");
    }

    #[test]
    fn test_install_request_serialization_round_trip() {
        let request = InstallRequest {
            packages: vec!["foo".to_string()],
            upgrade: true,
            venv: Some(PathBuf::from("/srv/app/venv")),
            options: options(&[("proxy", "http://squid:3128")]),
        };

        let json = serde_json::to_string(&request).unwrap();
        let decoded: InstallRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.packages, request.packages);
        assert!(decoded.upgrade);
        assert_eq!(decoded.venv, request.venv);
        assert_eq!(decoded.options, request.options);
    }

    #[test]
    fn test_install_request_defaults_missing_fields() {
        let decoded: InstallRequest = serde_json::from_str(r#"{"packages": ["foo"]}"#).unwrap();
        assert_eq!(decoded.packages, vec!["foo"]);
        assert!(!decoded.upgrade);
        assert!(decoded.venv.is_none());
        assert!(decoded.options.is_empty());
    }
}
