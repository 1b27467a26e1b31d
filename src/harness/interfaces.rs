//! Harness I/O boundary interfaces
//!
//! This module defines trait-based abstractions for everything the harness touches outside its own memory:
//! - Running external commands (build tool steps, the emulator)
//! - Talking to the running emulator (stdin writes, polling, termination)
//! - Working-directory file churn (stale artifact removal, reading the capture)
//!
//! The system implementations live in `system.rs`. Tests substitute in-memory fakes so the pipeline can be
//! exercised without `make` or `qemu`.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that escape [`super::Harness::run`].
///
/// Everything else (failed build steps, a missing emulator binary, termination errors) is absorbed into the
/// run's step records.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("working directory '{}' does not exist or is not a directory", .0.display())]
    MissingWorkdir(PathBuf),

    #[error("failed to read capture file '{}': {source}", .path.display())]
    ReadCapture {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write run report '{}': {source}", .path.display())]
    WriteReport {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Commands
// ============================================================================

/// Program plus arguments for one external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[String]) -> Self {
        Self {
            program: program.into(),
            args: args.to_vec(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How a process ended. `code` is `None` when it was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    pub code: Option<i32>,
}

impl ExitInfo {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ExitInfo {
    fn from(status: ExitStatus) -> Self {
        Self { code: status.code() }
    }
}

/// Launch external commands.
pub trait CommandRunner {
    /// Run a command to completion in `cwd`, appending its stdout and stderr to `log`.
    fn run_logged(&self, spec: &CommandSpec, cwd: &Path, log: &Path) -> io::Result<ExitInfo>;

    /// Start the emulator in `cwd` with a piped stdin and stdout truncated into `capture`.
    fn spawn_emulator(&self, spec: &CommandSpec, cwd: &Path, capture: &Path) -> io::Result<Box<dyn EmulatorProcess>>;
}

// ============================================================================
// Running emulator
// ============================================================================

/// Handle on the running emulator child.
pub trait EmulatorProcess {
    /// OS process id of the tracked child.
    fn id(&self) -> u32;

    /// Poll for exit without blocking.
    fn try_wait(&mut self) -> io::Result<Option<ExitInfo>>;

    /// Write one line to the child's stdin.
    fn send(&mut self, line: &str) -> io::Result<()>;

    /// Stop the tracked child. Succeeds if it already exited.
    fn terminate(&mut self) -> io::Result<()>;

    /// Kill every process in the child's process group (the emulator started by the build tool included).
    fn kill_group(&mut self) -> io::Result<()>;

    /// Collect the child's exit status after termination.
    fn reap(&mut self) -> io::Result<ExitInfo>;
}

// ============================================================================
// Working directory
// ============================================================================

/// File operations scoped to the harness working directory.
pub trait Workspace {
    /// Directory every command runs in and every artifact lives in.
    fn root(&self) -> &Path;

    fn path_of(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Delete `name` if present. Returns whether a file was removed.
    fn remove_if_exists(&self, name: &str) -> io::Result<bool>;

    /// Create `name` empty, discarding previous contents.
    fn truncate(&self, name: &str) -> io::Result<()>;

    /// Read `name` in full, `None` if it does not exist.
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>>;
}
