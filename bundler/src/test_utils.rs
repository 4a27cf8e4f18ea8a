//! Shared test utilities for the bundler crate.

use crate::exec::CommandExecutor;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.cast_unsigned())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Side effect a stubbed command performs in its working directory.
pub type CallEffect = Box<dyn Fn(&Path)>;

/// Represents an expected command invocation for testing.
pub struct ExpectedCall {
    /// The command to execute (e.g., "bun").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<&'static str>,
    /// The result to return when this command is invoked.
    pub result: std::io::Result<Output>,
    /// Optional side effect applied to the working directory before
    /// returning, e.g. materializing `node_modules`.
    pub effect: Option<CallEffect>,
}

impl ExpectedCall {
    /// Expect `cmd args...` and answer with `result`.
    #[must_use]
    pub fn new(cmd: &'static str, args: Vec<&'static str>, result: std::io::Result<Output>) -> Self {
        Self {
            cmd,
            args,
            result,
            effect: None,
        }
    }

    /// Attach a side effect run against the working directory.
    #[must_use]
    pub fn with_effect(mut self, effect: impl Fn(&Path) + 'static) -> Self {
        self.effect = Some(Box::new(effect));
        self
    }
}

impl std::fmt::Debug for ExpectedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpectedCall")
            .field("cmd", &self.cmd)
            .field("args", &self.args)
            .field("result", &self.result)
            .field("effect", &self.effect.is_some())
            .finish()
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    #[expect(
        clippy::expect_used,
        clippy::panic_in_result_fn,
        reason = "an unscripted or mismatched invocation is a test failure"
    )]
    fn run(&self, cmd: &str, args: &[&str], cwd: &Path) -> std::io::Result<Output> {
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .expect("unexpected command invocation");

        assert_eq!(call.cmd, cmd);
        assert_eq!(call.args.as_slice(), args);

        if let Some(effect) = &call.effect {
            effect(cwd);
        }
        call.result
    }
}
