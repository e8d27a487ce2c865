//! charm-pip - Python package management helpers for deployed units
//!
//! A thin layer over the host's package installer used by deployment
//! automation: install and uninstall Python packages, install from
//! requirements files, list what is present, and materialize isolated
//! virtual environments. All real work is delegated to external tools
//! invoked as blocking child processes; this crate only assembles,
//! logs, and runs their command lines.
//!
//! Concurrent invocations against the same host are neither serialized
//! nor validated here; whether the underlying tools tolerate them is up
//! to the caller.

pub mod apt;
pub mod config;
pub mod options;
pub mod pip;
pub mod runner;
pub mod venv;

pub use config::Config;
pub use pip::{InstallRequest, PackageInfo, PipClient};
pub use venv::create_virtualenv;
