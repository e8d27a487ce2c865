//! Blocking invocation of external host tools
//!
//! Every operation that touches the outside world goes through this module:
//! commands run synchronously to completion, output is captured, and a
//! non-zero exit becomes a typed error carrying the captured stderr. No
//! retries and no timeouts; if a tool hangs, the caller hangs with it.

use log::debug;
use std::env;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus, Output};

/// Execution failure of an external tool
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Render a program and its arguments as a single loggable command line
pub fn render_command(program: &str, args: &[String]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Run an external tool to completion, capturing its output.
///
/// Blocks the calling thread until the process exits. Extra environment
/// variables in `envs` are set on the child only.
pub fn run(program: &str, args: &[String], envs: &[(&str, &str)]) -> Result<Output, ExecError> {
    let command_line = render_command(program, args);
    debug!("Running command: {}", command_line);

    let mut command = Command::new(program);
    command.args(args);
    for (key, value) in envs {
        command.env(key, value);
    }

    let output = command.output().map_err(|source| ExecError::Launch {
        command: command_line.clone(),
        source,
    })?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(ExecError::CommandFailed {
            command: command_line,
            status: output.status,
            stderr,
        })
    }
}

/// Check whether an executable can be resolved on the host.
///
/// Probes the PATH via `which` first, then any known absolute locations.
pub fn is_executable_available(executable_name: &str, known_paths: &[&str]) -> bool {
    if let Ok(output) = Command::new("which").arg(executable_name).output() {
        if output.status.success() {
            return true;
        }
    }

    known_paths.iter().any(|path| Path::new(path).exists())
}

/// Scoped save/restore of a process environment variable.
///
/// The variable is captured on construction and put back when the guard is
/// dropped, on every exit path. Installer invocations use this to keep
/// interpreter path variables out of the child process without leaving the
/// hook environment mutated afterwards.
pub struct EnvGuard {
    key: String,
    saved: Option<OsString>,
}

impl EnvGuard {
    /// Capture `key` and remove it for the lifetime of the guard
    pub fn clear(key: &str) -> Self {
        let saved = env::var_os(key);
        env::remove_var(key);
        Self {
            key: key.to_string(),
            saved,
        }
    }

    /// Capture `key` and set it to `value` for the lifetime of the guard
    pub fn set(key: &str, value: &str) -> Self {
        let saved = env::var_os(key);
        env::set_var(key, value);
        Self {
            key: key.to_string(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.saved.take() {
            Some(value) => env::set_var(&self.key, value),
            None => env::remove_var(&self.key),
        }
    }
}
