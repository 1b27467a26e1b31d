//! CLI module for crashcheck
//!
//! ## Commands
//!
//! - `run` - Rebuild, boot under the emulator, drive the test, print the verdict (default when no subcommand)
//! - `classify <file>` - Print the verdict for an existing console capture
//! - `clean` - Remove the transient artifacts a run leaves behind
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use crashcheck_core::Verdict;

use crate::harness::HarnessError;
use crate::version::CRASHCHECK_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The harness itself could not complete (unreadable capture, missing directory, ...)
    pub const HARNESS_ERROR: ExitCode = ExitCode(2);
    pub const UNFINISHED: ExitCode = ExitCode(3);

    /// Per-verdict exit code used with `--exit-code`.
    pub fn for_verdict(verdict: Verdict) -> Self {
        match verdict {
            Verdict::CrashSafe => ExitCode::SUCCESS,
            Verdict::NotCrashSafe => ExitCode::FAILURE,
            Verdict::Unfinished => ExitCode::UNFINISHED,
        }
    }
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        Self::new(format!("error: {err}"), ExitCode::HARNESS_ERROR)
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Crash-safety harness for the lab5 file system
#[derive(Parser, Debug)]
#[command(name = "crashcheck")]
#[command(version = CRASHCHECK_VERSION)]
#[command(about = "Rebuild the kernel, run a crash-recovery test under the emulator, and judge the console output")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for the default `run` action
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild, boot under the emulator, drive the test, and print the verdict
    Run(RunArgs),

    /// Print the verdict for an existing console capture
    Classify {
        /// Captured console output
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Guest test whose pass marker to look for
        #[arg(long = "test", value_name = "NAME")]
        test_name: Option<String>,
    },

    /// Remove input.txt, output.txt and the scratch log
    Clean {
        /// Working directory
        #[arg(short = 'C', long = "dir", value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },
}

/// Options for a harness run. Unset options keep the reference defaults.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Working directory holding the kernel's Makefile
    #[arg(short = 'C', long = "dir", value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Build tool used for clean, build and emulator steps (default: make)
    #[arg(long = "make", value_name = "PROGRAM")]
    pub build_program: Option<String>,

    /// Build tool target that boots the emulator (default: qemu)
    #[arg(long = "target", value_name = "TARGET")]
    pub emulator_target: Option<String>,

    /// Guest test program to run (default: lab5test_b)
    #[arg(long = "test", value_name = "NAME")]
    pub test_name: Option<String>,

    /// Stop driving the emulator after this many milliseconds (default: 6000)
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Pause between command lines in milliseconds (default: 200)
    #[arg(long = "interval-ms", value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Maximum number of command lines written (default: 30)
    #[arg(long = "max-writes", value_name = "N")]
    pub max_writes: Option<u32>,

    /// Also `pkill` processes with this name after the run
    #[arg(long = "sweep", value_name = "NAME")]
    pub sweep: Option<String>,

    /// Write a JSON run report to this path
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Exit 0/1/3 for crash-safe/not crash-safe/unfinished instead of always 0
    #[arg(long = "exit-code")]
    pub exit_code: bool,

    /// Print each step on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Some(Command::Run(args)) => commands::run_harness(&args),
        Some(Command::Classify { file, test_name }) => commands::classify_file(&file, test_name.as_deref()),
        Some(Command::Clean { dir }) => commands::clean(&dir),
        None => commands::run_harness(&cli.run),
    }
}

// ============================================================================
// Tests
// ============================================================================
