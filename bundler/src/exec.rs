//! External command execution.
//!
//! The package installer and the host build are opaque external commands.
//! Both go through [`CommandExecutor`] so pipelines can be exercised with a
//! scripted stub instead of spawning processes.

use std::path::Path;
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `cmd` with `args` in the working directory `cwd` and returns
    /// the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use offline_bundler::exec::{CommandExecutor, SystemCommandExecutor};
    /// use std::path::Path;
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("bun", &["--version"], Path::new("."))?;
    /// assert!(output.status.success());
    /// # Ok::<(), std::io::Error>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str], cwd: &Path) -> std::io::Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str], cwd: &Path) -> std::io::Result<Output> {
        log::debug!("running {cmd} {} in {}", args.join(" "), cwd.display());
        Command::new(cmd).args(args).current_dir(cwd).output()
    }
}

/// Render the diagnostic text of a failed command.
///
/// Prefers trimmed stderr, then stdout, then the exit status.
#[must_use]
pub fn failure_message(output: &Output) -> String {
    [&output.stderr, &output.stdout]
        .into_iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_owned())
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| format!("command exited with {}", output.status))
}
