//! Run reports and reporters
//!
//! ## HarnessReporter Trait
//!
//! The harness uses a `HarnessReporter` trait to separate presentation from the pipeline. The console reporter
//! prints exactly one line on stdout, the verdict, and keeps everything else on stderr.

use std::fs;
use std::path::Path;
use std::time::Duration;

use crashcheck_core::Verdict;
use serde::{Serialize, Serializer};

use super::interfaces::HarnessError;
use super::outcome::{StepOutcome, StepRecord};

/// Why the write loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// The emulator exited on its own
    ChildExited { code: Option<i32> },
    /// The wall-clock bound elapsed
    Deadline,
    /// The write cap was reached
    WriteCap,
    /// Polling the child failed
    PollFailed,
    /// The emulator never started
    LaunchFailed,
}

impl StopReason {
    /// Whether the child was abandoned while presumably still running.
    pub fn timed_out(self) -> bool {
        matches!(self, StopReason::Deadline | StopReason::WriteCap)
    }
}

/// Everything observed during one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(serialize_with = "verdict_str")]
    pub verdict: Verdict,
    /// Console line that matched the verdict's marker
    pub evidence: Option<String>,
    pub test_name: String,
    /// Command lines written (attempted) to the emulator
    pub writes: u32,
    pub stop: StopReason,
    /// Bytes read back from the capture file
    pub captured_bytes: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "duration_ms")]
    pub elapsed: Duration,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    /// Steps that did not complete cleanly.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| !s.outcome.is_ok())
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), HarnessError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| HarnessError::WriteReport {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        fs::write(path, json + "\n").map_err(|source| HarnessError::WriteReport {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn verdict_str<S: Serializer>(verdict: &Verdict, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(verdict.as_str())
}

fn duration_ms<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// Reporter Trait
// ============================================================================

/// Trait for observing a harness run.
pub trait HarnessReporter {
    /// Called after every best-effort step
    fn on_step_complete(&mut self, _record: &StepRecord) {}

    /// Called after each command line is written; `count` starts at 1
    fn on_write(&mut self, _count: u32) {}

    /// Called once the write loop has stopped
    fn on_loop_complete(&mut self, _writes: u32, _stop: StopReason) {}

    /// Called with the final report
    fn on_run_complete(&mut self, report: &RunReport);
}

/// Default console reporter
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl HarnessReporter for ConsoleReporter {
    fn on_step_complete(&mut self, record: &StepRecord) {
        if !self.verbose {
            return;
        }
        match &record.outcome {
            StepOutcome::Ok => eprintln!("{:?} {} ... ok", record.step, record.target),
            StepOutcome::Exited { code: Some(code) } => {
                eprintln!("{:?} {} ... exited with {}", record.step, record.target, code)
            }
            StepOutcome::Exited { code: None } => {
                eprintln!("{:?} {} ... killed by signal", record.step, record.target)
            }
            StepOutcome::Error { message } => eprintln!("{:?} {} ... {}", record.step, record.target, message),
        }
    }

    fn on_loop_complete(&mut self, writes: u32, stop: StopReason) {
        if self.verbose {
            eprintln!("sent {} command line(s), stopped: {:?}", writes, stop);
        }
    }

    fn on_run_complete(&mut self, report: &RunReport) {
        if self.verbose {
            if let Some(evidence) = &report.evidence {
                eprintln!("evidence: {}", evidence);
            }
        }
        println!("{}", report.verdict);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::harness::outcome::Step;

    fn sample() -> RunReport {
        RunReport {
            verdict: Verdict::CrashSafe,
            evidence: Some("lab5test_b passed!".to_string()),
            test_name: "lab5test_b".to_string(),
            writes: 4,
            stop: StopReason::ChildExited { code: Some(0) },
            captured_bytes: 42,
            elapsed: Duration::from_millis(812),
            steps: vec![
                StepRecord::new(Step::Clean, "make clean", StepOutcome::Ok),
                StepRecord::new(Step::Build, "make", StepOutcome::Exited { code: Some(2) }),
            ],
        }
    }

    #[test]
    fn test_report_json_shape() {
        insta::assert_json_snapshot!(sample(), @r###"
        {
          "verdict": "file system is crash-safe",
          "evidence": "lab5test_b passed!",
          "test_name": "lab5test_b",
          "writes": 4,
          "stop": {
            "reason": "child_exited",
            "code": 0
          },
          "captured_bytes": 42,
          "elapsed_ms": 812,
          "steps": [
            {
              "step": "clean",
              "target": "make clean",
              "status": "ok"
            },
            {
              "step": "build",
              "target": "make",
              "status": "exited",
              "code": 2
            }
          ]
        }
        "###);
    }

    #[test]
    fn test_failed_steps() {
        let report = sample();
        let failed: Vec<_> = report.failed_steps().map(|s| s.step).collect();
        assert_eq!(failed, vec![Step::Build]);
    }

    #[test]
    fn test_timed_out() {
        assert!(StopReason::Deadline.timed_out());
        assert!(StopReason::WriteCap.timed_out());
        assert!(!StopReason::ChildExited { code: None }.timed_out());
        assert!(!StopReason::LaunchFailed.timed_out());
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        sample().write_json(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["verdict"], "file system is crash-safe");
        assert_eq!(value["steps"].as_array().unwrap().len(), 2);
    }
}
