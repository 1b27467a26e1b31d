//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::HarnessConfig;
use crate::harness::{
    ConsoleReporter, FsWorkspace, Harness, HarnessError, RunReport, SystemRunner, classify_bytes,
};

use super::{CliError, CliResult, ExitCode, RunArgs};

/// Map CLI options onto the reference configuration.
pub fn config_from_args(args: &RunArgs) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    if let Some(program) = &args.build_program {
        config = config.with_build_program(program.clone());
    }
    if let Some(target) = &args.emulator_target {
        config = config.with_emulator_args([target.clone()]);
    }
    if let Some(name) = &args.test_name {
        config = config.with_test_name(name.clone());
    }
    if let Some(ms) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = args.interval_ms {
        config = config.with_poll_interval(Duration::from_millis(ms));
    }
    if let Some(n) = args.max_writes {
        config = config.with_max_writes(n);
    }
    config.with_sweep_process(args.sweep.clone())
}

/// Run the harness and print the verdict.
pub fn run_harness(args: &RunArgs) -> CliResult<ExitCode> {
    let config = config_from_args(args);
    match crashcheck_core::markers::lookup(&config.test_name) {
        Some(info) => tracing::info!(
            test = info.name,
            injects_crashes = info.injects_crashes,
            "{}",
            info.description
        ),
        None => tracing::warn!(test = %config.test_name, "unknown guest test; expecting '{}'", config.pass_marker()),
    }

    let harness: Harness<SystemRunner, FsWorkspace> = Harness::system(config, &args.dir)?;
    let mut reporter = ConsoleReporter::new(args.verbose);
    let report = harness.run(&mut reporter)?;

    if let Some(path) = &args.report {
        report.write_json(path)?;
    }
    if let Some(hint) = unfinished_hint(&report) {
        tracing::warn!("{hint}");
    }

    if args.exit_code {
        Ok(ExitCode::for_verdict(report.verdict))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Suggest a longer bound when the guest was cut off before printing either marker.
fn unfinished_hint(report: &RunReport) -> Option<String> {
    if report.verdict.is_conclusive() || !report.stop.timed_out() {
        return None;
    }
    Some(format!(
        "no marker after {} writes in {} ms; try a larger --timeout-ms or --max-writes",
        report.writes,
        report.elapsed.as_millis()
    ))
}

/// Print the verdict for a saved console capture.
pub fn classify_file(path: &Path, test_name: Option<&str>) -> CliResult<ExitCode> {
    let bytes = fs::read(path).map_err(|source| {
        CliError::from(HarnessError::ReadCapture {
            path: path.to_path_buf(),
            source,
        })
    })?;
    let config = match test_name {
        Some(name) => HarnessConfig::new().with_test_name(name),
        None => HarnessConfig::new(),
    };
    let classification = classify_bytes(&bytes, &config.pass_marker());
    if let Some(evidence) = &classification.evidence {
        tracing::info!(%evidence, "matched");
    }
    println!("{}", classification.verdict);
    Ok(ExitCode::SUCCESS)
}

/// Remove leftover artifacts from a working directory.
pub fn clean(dir: &Path) -> CliResult<ExitCode> {
    let harness = Harness::system(HarnessConfig::default(), dir)?;
    let failed: Vec<_> = harness
        .clean()
        .into_iter()
        .filter(|record| !record.outcome.is_ok())
        .collect();
    if failed.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    let names: Vec<_> = failed.iter().map(|r| r.target.as_str()).collect();
    Err(CliError::failure(format!("could not remove: {}", names.join(", "))))
}
