//! Harness configuration
//!
//! Defaults reproduce the reference driver: `make clean`, `make`, `make qemu`, the `lab5test_b` command
//! written every 200ms, and a 6 second bound.

use std::time::Duration;

use crashcheck_core::{DEFAULT_TEST_NAME, command_line, pass_marker};

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Build tool invoked for every external step
    pub build_program: String,
    /// Arguments for the clean step
    pub clean_args: Vec<String>,
    /// Arguments for the build step
    pub build_args: Vec<String>,
    /// Arguments that boot the kernel under the emulator
    pub emulator_args: Vec<String>,
    /// Guest test program to run
    pub test_name: String,
    /// Pause after each command line written to the emulator
    pub poll_interval: Duration,
    /// Wall-clock bound on the write loop
    pub timeout: Duration,
    /// Hard cap on command lines written
    pub max_writes: u32,
    /// Stale input artifact removed before each run
    pub input_file: String,
    /// File receiving the emulator's console output
    pub capture_file: String,
    /// Sink for build tool chatter, removed after the run
    pub scratch_file: String,
    /// Process name swept with `pkill` after the run, if any
    pub sweep_process: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            build_program: "make".to_string(),
            clean_args: vec!["clean".to_string()],
            build_args: Vec::new(),
            emulator_args: vec!["qemu".to_string()],
            test_name: DEFAULT_TEST_NAME.to_string(),
            poll_interval: Duration::from_millis(200),
            timeout: Duration::from_secs(6),
            max_writes: 30,
            input_file: "input.txt".to_string(),
            capture_file: "output.txt".to_string(),
            scratch_file: "garbage.txt".to_string(),
            sweep_process: None,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the build tool
    pub fn with_build_program(mut self, program: impl Into<String>) -> Self {
        self.build_program = program.into();
        self
    }

    /// Set the clean step arguments
    pub fn with_clean_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clean_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the build step arguments
    pub fn with_build_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the emulator launch arguments
    pub fn with_emulator_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emulator_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the guest test program
    pub fn with_test_name(mut self, name: impl Into<String>) -> Self {
        self.test_name = name.into();
        self
    }

    /// Set the pause between command lines
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the wall-clock bound
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the write cap
    pub fn with_max_writes(mut self, max_writes: u32) -> Self {
        self.max_writes = max_writes;
        self
    }

    /// Enable the name-based `pkill` sweep
    pub fn with_sweep_process(mut self, name: Option<String>) -> Self {
        self.sweep_process = name;
        self
    }

    /// Line written to the emulator's stdin each iteration
    pub fn command_line(&self) -> String {
        command_line(&self.test_name)
    }

    /// Console marker the test prints on success
    pub fn pass_marker(&self) -> String {
        pass_marker(&self.test_name)
    }

    /// Every transient artifact the harness creates in the working directory
    pub fn artifacts(&self) -> [&str; 3] {
        [&self.input_file, &self.capture_file, &self.scratch_file]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_driver() {
        let config = HarnessConfig::default();
        assert_eq!(config.build_program, "make");
        assert_eq!(config.clean_args, vec!["clean"]);
        assert!(config.build_args.is_empty());
        assert_eq!(config.emulator_args, vec!["qemu"]);
        assert_eq!(config.poll_interval, Duration::from_millis(200));
        assert_eq!(config.timeout, Duration::from_secs(6));
        assert_eq!(config.max_writes, 30);
        assert!(config.sweep_process.is_none());
    }

    #[test]
    fn test_default_protocol() {
        let config = HarnessConfig::default();
        assert_eq!(config.command_line(), "lab5test_b\n");
        assert_eq!(config.pass_marker(), "lab5test_b passed!");
    }

    #[test]
    fn test_with_test_name_changes_protocol() {
        let config = HarnessConfig::new().with_test_name("lab5test_a");
        assert_eq!(config.command_line(), "lab5test_a\n");
        assert_eq!(config.pass_marker(), "lab5test_a passed!");
    }

    #[test]
    fn test_builder_chain() {
        let config = HarnessConfig::new()
            .with_build_program("gmake")
            .with_emulator_args(["qemu-nox"])
            .with_timeout(Duration::from_secs(1))
            .with_max_writes(5);

        assert_eq!(config.build_program, "gmake");
        assert_eq!(config.emulator_args, vec!["qemu-nox"]);
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.max_writes, 5);
        // Other fields unchanged
        assert_eq!(config.clean_args, vec!["clean"]);
    }

    #[test]
    fn test_builder_override() {
        let config = HarnessConfig::new().with_max_writes(3).with_max_writes(7);
        assert_eq!(config.max_writes, 7); // Last value wins
    }

    #[test]
    fn test_artifacts() {
        let config = HarnessConfig::default();
        assert_eq!(config.artifacts(), ["input.txt", "output.txt", "garbage.txt"]);
    }
}
