//! Smoke tests over real processes
//!
//! `sh` stands in for both the build tool and the emulator: the harness only cares that the "emulator" reads
//! command lines on stdin and writes a console on stdout.

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crashcheck::harness::{ConsoleReporter, StopReason};
use crashcheck::{Harness, HarnessConfig, Verdict};

fn shell_config(emulator_script: &str) -> HarnessConfig {
    HarnessConfig::default()
        .with_build_program("sh")
        .with_clean_args(["-c", "echo cleaning"])
        .with_build_args(["-c", "echo building; echo warning >&2"])
        .with_emulator_args(["-c", emulator_script])
        .with_poll_interval(Duration::from_millis(20))
}

#[test]
fn echoing_emulator_passes() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("input.txt"), "stale").unwrap();

    let config = shell_config("read cmd; echo \"running $cmd\"; echo \"$cmd passed!\"");
    let harness = Harness::system(config, dir.path()).unwrap();
    let report = harness.run(&mut ConsoleReporter::default()).unwrap();

    assert_eq!(report.verdict, Verdict::CrashSafe);
    assert!(matches!(report.stop, StopReason::ChildExited { code: Some(0) }));
    assert_eq!(
        fs::read_to_string(dir.path().join("output.txt")).unwrap(),
        "running lab5test_b\nlab5test_b passed!\n"
    );
    assert!(!dir.path().join("input.txt").exists());
    assert!(!dir.path().join("garbage.txt").exists());
}

#[test]
fn inconsistent_emulator_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = shell_config("read cmd; echo 'ERROR (line 64): file system not in consistent state!'");
    let harness = Harness::system(config, dir.path()).unwrap();
    let report = harness.run(&mut ConsoleReporter::default()).unwrap();

    assert_eq!(report.verdict, Verdict::NotCrashSafe);
}

#[test]
fn hung_emulator_is_bounded_and_killed() {
    let dir = tempfile::tempdir().unwrap();
    // Swallows input forever and never prints a marker.
    let config = shell_config("echo booting; while true; do read cmd || sleep 1; done")
        .with_timeout(Duration::from_millis(300));
    let harness = Harness::system(config, dir.path()).unwrap();

    let started = Instant::now();
    let report = harness.run(&mut ConsoleReporter::default()).unwrap();

    assert_eq!(report.verdict, Verdict::Unfinished);
    assert_eq!(report.stop, StopReason::Deadline);
    assert!(report.writes <= 30);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(fs::read_to_string(dir.path().join("output.txt")).unwrap(), "booting\n");
}

/// Running (not exited, not a zombie awaiting its reaper).
fn is_alive(pid: &str) -> bool {
    if Path::new("/proc/self").exists() {
        return match fs::read_to_string(format!("/proc/{pid}/stat")) {
            // State is the first field after the parenthesised command name.
            Ok(stat) => !stat.rsplit(')').next().is_some_and(|rest| rest.trim_start().starts_with('Z')),
            Err(_) => false,
        };
    }
    Command::new("kill")
        .args(["-0", pid])
        .stderr(Stdio::null())
        .status()
        .unwrap()
        .success()
}

#[test]
fn grandchildren_do_not_outlive_the_run() {
    let dir = tempfile::tempdir().unwrap();
    // `make qemu` runs QEMU as a child; the background sleeper plays that part.
    let config = shell_config("sleep 1000 & echo $! > sleeper.pid; while true; do read cmd || sleep 1; done")
        .with_timeout(Duration::from_millis(300));
    let harness = Harness::system(config, dir.path()).unwrap();
    let report = harness.run(&mut ConsoleReporter::default()).unwrap();

    assert_eq!(report.stop, StopReason::Deadline);
    assert!(report.failed_steps().next().is_none(), "{:?}", report.steps);

    let pid = fs::read_to_string(dir.path().join("sleeper.pid")).unwrap();
    let pid = pid.trim();
    let deadline = Instant::now() + Duration::from_secs(5);
    while is_alive(pid) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert!(!is_alive(pid), "process {pid} survived the run");
}

#[test]
fn missing_build_tool_is_absorbed() {
    let dir = tempfile::tempdir().unwrap();
    let config = HarnessConfig::default().with_build_program("crashcheck-no-such-make");
    let harness = Harness::system(config, dir.path()).unwrap();
    let report = harness.run(&mut ConsoleReporter::default()).unwrap();

    assert_eq!(report.verdict, Verdict::Unfinished);
    assert_eq!(report.stop, StopReason::LaunchFailed);
    assert!(!dir.path().join("garbage.txt").exists());
}
