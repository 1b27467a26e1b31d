//! Best-effort step records
//!
//! Cleanup, build, and termination steps must never block the verdict. Each one produces a [`StepRecord`] that
//! is logged and kept in the run report instead of being propagated.

use std::io;

use serde::Serialize;

use super::interfaces::ExitInfo;

/// Pipeline stage a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Truncate the scratch log
    PrepareScratch,
    /// `make clean`
    Clean,
    /// Remove a stale artifact
    RemoveStale,
    /// `make`
    Build,
    /// Spawn the emulator
    Launch,
    /// Stop the tracked child
    Terminate,
    /// Kill the child's process group
    KillGroup,
    /// Collect the child's exit status
    Reap,
    /// Name-based `pkill` fallback
    Sweep,
    /// Delete the scratch log
    RemoveScratch,
}

/// Result of one best-effort step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Completed (exit status 0 for commands)
    Ok,
    /// Command ran but exited unsuccessfully; `code` is `None` for a signal
    Exited { code: Option<i32> },
    /// Could not be performed at all
    Error { message: String },
}

impl StepOutcome {
    pub fn from_exit(result: io::Result<ExitInfo>) -> Self {
        match result {
            Ok(exit) if exit.success() => StepOutcome::Ok,
            Ok(exit) => StepOutcome::Exited { code: exit.code },
            Err(e) => StepOutcome::Error { message: e.to_string() },
        }
    }

    pub fn from_io<T>(result: io::Result<T>) -> Self {
        match result {
            Ok(_) => StepOutcome::Ok,
            Err(e) => StepOutcome::Error { message: e.to_string() },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StepOutcome::Ok)
    }
}

/// One entry in the run's step log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: Step,
    /// Command line or file the step acted on
    pub target: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl StepRecord {
    /// Build a record and log it; failures go out at `warn`.
    pub fn new(step: Step, target: impl Into<String>, outcome: StepOutcome) -> Self {
        let record = Self {
            step,
            target: target.into(),
            outcome,
        };
        match &record.outcome {
            StepOutcome::Ok => tracing::debug!(step = ?record.step, target = %record.target, "step ok"),
            StepOutcome::Exited { code } => {
                tracing::warn!(step = ?record.step, target = %record.target, ?code, "step exited unsuccessfully")
            }
            StepOutcome::Error { message } => {
                tracing::warn!(step = ?record.step, target = %record.target, error = %message, "step failed")
            }
        }
        record
    }
}
