//! Operator entry point for the charm-pip helpers
//!
//! A thin wrapper over the library: parses a subcommand from argv, builds
//! the request, and reports failures through the process exit code.

use anyhow::{bail, Result};
use charm_pip::options::OptionMap;
use charm_pip::{InstallRequest, PipClient};
use std::env;
use std::path::PathBuf;

fn print_usage(program: &str) {
    println!("charm-pip - Python package helpers for deployed units");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("\nUsage: {} <command> [options]\n", program);
    println!("Commands:");
    println!("  install <package>...            Install packages");
    println!("  uninstall <package>...          Uninstall packages");
    println!("  list                            List installed packages");
    println!("  install-requirements <file>     Install from a requirements file");
    println!("  create-virtualenv [path]        Create a virtual environment");
    println!("\nOptions:");
    println!("  --upgrade                 Upgrade already installed packages (install)");
    println!("  --venv <path>             Install into a virtual environment (install)");
    println!("  --constraints <file>      Constraints file (install-requirements)");
    println!("  --proxy <url>             Proxy to reach the package index");
    println!("  --index-url <url>         Alternative package index (install)");
    println!("  --src <dir>               Directory for editable checkouts");
    println!("  --log <file>              Extra installer log file");
    println!("\nEnvironment Variables:");
    println!("  CHARM_DIR=<path>              Deployment working directory");
    println!("  CHARM_PIP_COMMAND=<name>      Installer command (default: pip3)");
    println!("  CHARM_PIP_VIRTUALENV=<name>   Virtualenv command (default: virtualenv)");
    println!("  RUST_LOG=<level>              Log level (error|warn|info|debug)");
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("charm-pip");

    if args.contains(&"--version".to_string()) {
        println!("charm-pip {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if args.len() < 2 || args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        print_usage(program);
        return Ok(());
    }

    let client = PipClient::new();

    match args[1].as_str() {
        "install" => {
            let mut request = InstallRequest::default();
            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--upgrade" => {
                        request.upgrade = true;
                        i += 1;
                    }
                    "--venv" => {
                        if i + 1 >= args.len() {
                            bail!("--venv requires a path");
                        }
                        request.venv = Some(PathBuf::from(&args[i + 1]));
                        i += 2;
                    }
                    flag if flag.starts_with("--") => {
                        if i + 1 >= args.len() {
                            bail!("{} requires a value", flag);
                        }
                        request
                            .options
                            .insert(flag[2..].to_string(), args[i + 1].clone());
                        i += 2;
                    }
                    package => {
                        request.packages.push(package.to_string());
                        i += 1;
                    }
                }
            }
            if request.packages.is_empty() {
                bail!("install requires at least one package");
            }
            client.install(&request)
        }
        "uninstall" => {
            let (packages, options) = collect_packages_and_options(&args[2..])?;
            if packages.is_empty() {
                bail!("uninstall requires at least one package");
            }
            client.uninstall(&packages, &options)
        }
        "list" => {
            for package in client.list()? {
                println!("{} {}", package.name, package.version);
            }
            Ok(())
        }
        "install-requirements" => {
            let mut requirements: Option<PathBuf> = None;
            let mut constraints: Option<PathBuf> = None;
            let mut options = OptionMap::new();
            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--constraints" | "-c" => {
                        if i + 1 >= args.len() {
                            bail!("--constraints requires a path");
                        }
                        constraints = Some(PathBuf::from(&args[i + 1]));
                        i += 2;
                    }
                    flag if flag.starts_with("--") => {
                        if i + 1 >= args.len() {
                            bail!("{} requires a value", flag);
                        }
                        options.insert(flag[2..].to_string(), args[i + 1].clone());
                        i += 2;
                    }
                    path => {
                        if requirements.is_some() {
                            bail!("Only one requirements file may be given");
                        }
                        requirements = Some(PathBuf::from(path));
                        i += 1;
                    }
                }
            }
            match requirements {
                Some(requirements) => {
                    client.install_requirements(&requirements, constraints.as_deref(), &options)
                }
                None => bail!("install-requirements requires a file path"),
            }
        }
        "create-virtualenv" => {
            let path = args.get(2).map(PathBuf::from);
            let created = client.create_virtualenv(path.as_deref())?;
            println!("{}", created.display());
            Ok(())
        }
        other => {
            print_usage(program);
            bail!("Unknown command: {}", other);
        }
    }
}

fn collect_packages_and_options(args: &[String]) -> Result<(Vec<String>, OptionMap)> {
    let mut packages = Vec::new();
    let mut options = OptionMap::new();
    let mut i = 0;
    while i < args.len() {
        if let Some(name) = args[i].strip_prefix("--") {
            if i + 1 >= args.len() {
                bail!("--{} requires a value", name);
            }
            options.insert(name.to_string(), args[i + 1].clone());
            i += 2;
        } else {
            packages.push(args[i].clone());
            i += 1;
        }
    }
    Ok((packages, options))
}
