//! Crash-safety harness pipeline
//!
//! One run is a fixed sequence:
//!
//! 1. `make clean` (output into the scratch log)
//! 2. remove stale `input.txt` / `output.txt`
//! 3. `make`
//! 4. `make qemu` with piped stdin and stdout captured in `output.txt`
//! 5. write the test command every poll interval until the emulator exits, the deadline passes, or the write
//!    cap is reached
//! 6. terminate the child and kill its process group
//! 7. read the capture back and classify it
//!
//! ## Modules
//!
//! - `interfaces` - Trait seams for process and file I/O, plus [`HarnessError`]
//! - `system` - Default implementations over `std::process` and the real filesystem
//! - `outcome` - Step records for best-effort work
//! - `report` - [`RunReport`] and the [`HarnessReporter`] trait
//!
//! Steps 1-3 and 6 never influence the verdict: their results are recorded and logged, then ignored.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod interfaces;
pub mod outcome;
pub mod report;
pub mod system;

use std::thread;
use std::time::Instant;

use crashcheck_core::{Classification, classify_with};

use crate::config::HarnessConfig;

pub use interfaces::{CommandRunner, CommandSpec, EmulatorProcess, ExitInfo, HarnessError, Workspace};
pub use outcome::{Step, StepOutcome, StepRecord};
pub use report::{ConsoleReporter, HarnessReporter, RunReport, StopReason};
pub use system::{FsWorkspace, SystemRunner};

/// Classify raw capture bytes. Invalid UTF-8 from a crashing guest is replaced, never rejected.
pub fn classify_bytes(bytes: &[u8], pass_marker: &str) -> Classification {
    classify_with(&String::from_utf8_lossy(bytes), pass_marker)
}

/// `pkill` exit status when no process matched.
const PKILL_NO_MATCH: i32 = 1;

fn push_step(steps: &mut Vec<StepRecord>, reporter: &mut dyn HarnessReporter, record: StepRecord) {
    reporter.on_step_complete(&record);
    steps.push(record);
}

/// Drives one rebuild-run-capture-classify cycle.
pub struct Harness<R, W> {
    config: HarnessConfig,
    runner: R,
    workspace: W,
}

impl Harness<SystemRunner, FsWorkspace> {
    /// Harness over real processes in `dir`.
    pub fn system(config: HarnessConfig, dir: impl Into<std::path::PathBuf>) -> Result<Self, HarnessError> {
        Ok(Self::new(config, SystemRunner, FsWorkspace::new(dir)?))
    }
}

impl<R: CommandRunner, W: Workspace> Harness<R, W> {
    pub fn new(config: HarnessConfig, runner: R, workspace: W) -> Self {
        Self {
            config,
            runner,
            workspace,
        }
    }

    /// Run the full pipeline and return the report.
    ///
    /// ## Errors
    ///
    /// Only a capture file that exists but cannot be read escapes as an error. Build failures, a missing
    /// emulator, and termination failures all end up in [`RunReport::steps`].
    #[tracing::instrument(skip_all, fields(dir = %self.workspace.root().display(), test = %self.config.test_name))]
    pub fn run(&self, reporter: &mut dyn HarnessReporter) -> Result<RunReport, HarnessError> {
        let started = Instant::now();
        let mut steps = Vec::new();

        let scratch = self.config.scratch_file.as_str();
        let outcome = StepOutcome::from_io(self.workspace.truncate(scratch));
        push_step(&mut steps, reporter, StepRecord::new(Step::PrepareScratch, scratch, outcome));

        tracing::info!("cleaning");
        let clean = CommandSpec::new(&self.config.build_program, &self.config.clean_args);
        push_step(&mut steps, reporter, self.run_step(Step::Clean, &clean));

        for name in [&self.config.input_file, &self.config.capture_file] {
            let outcome = StepOutcome::from_io(self.workspace.remove_if_exists(name));
            push_step(&mut steps, reporter, StepRecord::new(Step::RemoveStale, name.as_str(), outcome));
        }

        tracing::info!("building");
        let build = CommandSpec::new(&self.config.build_program, &self.config.build_args);
        push_step(&mut steps, reporter, self.run_step(Step::Build, &build));

        tracing::info!("launching emulator");
        let launch = CommandSpec::new(&self.config.build_program, &self.config.emulator_args);
        let capture_path = self.workspace.path_of(&self.config.capture_file);
        let (writes, stop) = match self.runner.spawn_emulator(&launch, self.workspace.root(), &capture_path) {
            Ok(mut emulator) => {
                push_step(&mut steps, reporter, StepRecord::new(Step::Launch, launch.to_string(), StepOutcome::Ok));
                let (writes, stop) = self.drive(emulator.as_mut(), reporter);
                reporter.on_loop_complete(writes, stop);

                let pid = emulator.id();
                tracing::info!(pid, writes, ?stop, "stopping emulator");
                let outcome = StepOutcome::from_io(emulator.terminate());
                push_step(&mut steps, reporter, StepRecord::new(Step::Terminate, format!("pid {pid}"), outcome));
                let outcome = StepOutcome::from_io(emulator.kill_group());
                push_step(&mut steps, reporter, StepRecord::new(Step::KillGroup, format!("pgid {pid}"), outcome));
                let outcome = StepOutcome::from_io(emulator.reap());
                push_step(&mut steps, reporter, StepRecord::new(Step::Reap, format!("pid {pid}"), outcome));
                (writes, stop)
            }
            Err(e) => {
                tracing::error!(command = %launch, error = %e, "emulator failed to start");
                let outcome = StepOutcome::Error { message: e.to_string() };
                push_step(&mut steps, reporter, StepRecord::new(Step::Launch, launch.to_string(), outcome));
                reporter.on_loop_complete(0, StopReason::LaunchFailed);
                (0, StopReason::LaunchFailed)
            }
        };

        if let Some(name) = &self.config.sweep_process {
            let sweep = CommandSpec::new("pkill", std::slice::from_ref(name));
            let outcome = match self.run_logged(&sweep) {
                // The group kill usually leaves nothing for pkill to match.
                Ok(ExitInfo { code: Some(PKILL_NO_MATCH) }) => StepOutcome::Ok,
                result => StepOutcome::from_exit(result),
            };
            push_step(&mut steps, reporter, StepRecord::new(Step::Sweep, sweep.to_string(), outcome));
        }

        let outcome = StepOutcome::from_io(self.workspace.remove_if_exists(scratch));
        push_step(&mut steps, reporter, StepRecord::new(Step::RemoveScratch, scratch, outcome));

        let captured = self
            .workspace
            .read(&self.config.capture_file)
            .map_err(|source| HarnessError::ReadCapture {
                path: capture_path,
                source,
            })?
            .unwrap_or_default();
        let Classification { verdict, evidence } = classify_bytes(&captured, &self.config.pass_marker());
        tracing::info!(%verdict, captured_bytes = captured.len(), "classified");

        let report = RunReport {
            verdict,
            evidence,
            test_name: self.config.test_name.clone(),
            writes,
            stop,
            captured_bytes: captured.len(),
            elapsed: started.elapsed(),
            steps,
        };
        reporter.on_run_complete(&report);
        Ok(report)
    }

    /// Remove every transient artifact. Safe to call when none exist.
    pub fn clean(&self) -> Vec<StepRecord> {
        self.config
            .artifacts()
            .into_iter()
            .map(|name| {
                StepRecord::new(
                    Step::RemoveStale,
                    name,
                    StepOutcome::from_io(self.workspace.remove_if_exists(name)),
                )
            })
            .collect()
    }

    fn run_step(&self, step: Step, spec: &CommandSpec) -> StepRecord {
        StepRecord::new(step, spec.to_string(), StepOutcome::from_exit(self.run_logged(spec)))
    }

    fn run_logged(&self, spec: &CommandSpec) -> std::io::Result<ExitInfo> {
        let log = self.workspace.path_of(&self.config.scratch_file);
        self.runner.run_logged(spec, self.workspace.root(), &log)
    }

    /// Write the command line until the child exits or the bound is hit.
    ///
    /// The bound is a wall-clock deadline plus a hard write cap, whichever comes first. Write errors (the child
    /// closed stdin) are not fatal; the next poll sees the exit.
    fn drive(&self, emulator: &mut dyn EmulatorProcess, reporter: &mut dyn HarnessReporter) -> (u32, StopReason) {
        let line = self.config.command_line();
        let deadline = Instant::now() + self.config.timeout;
        let mut writes = 0u32;

        loop {
            match emulator.try_wait() {
                Ok(Some(exit)) => return (writes, StopReason::ChildExited { code: exit.code }),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "polling emulator failed");
                    return (writes, StopReason::PollFailed);
                }
            }
            if writes >= self.config.max_writes {
                return (writes, StopReason::WriteCap);
            }
            if Instant::now() >= deadline {
                return (writes, StopReason::Deadline);
            }

            if let Err(e) = emulator.send(&line) {
                tracing::debug!(error = %e, "write to emulator failed");
            }
            writes += 1;
            reporter.on_write(writes);
            thread::sleep(self.config.poll_interval);
        }
    }
}
