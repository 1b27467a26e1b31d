//! Console marker registry.
//!
//! The guest user programs report their result by printing fixed strings on the console. This module
//! centralizes those spellings so the harness never compares against ad-hoc literals.
//!
//! ## Notes
//!
//! - `lab5test_b` crashes the kernel after an increasing number of block writes and is re-run on every boot,
//!   which is why the harness keeps sending its command line instead of sending it once.
//! - Every integrity failure the guest reports contains the word `consistent` (as in "not in consistent
//!   state"), so that single word is the inconsistency marker.

/// Test program run by default.
pub const DEFAULT_TEST_NAME: &str = "lab5test_b";

/// Substring present in every integrity failure the guest prints.
pub const INCONSISTENT_MARKER: &str = "consistent";

/// Suffix a guest test prints after its name once every check succeeded.
pub const PASS_SUFFIX: &str = " passed!";

/// Stable identifier for the guest tests the harness knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuestTestId {
    ModificationWorkload,
    CrashRecovery,
}

/// Metadata entry for a guest test program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestTestInfo {
    pub id: GuestTestId,
    /// Program name typed at the guest shell.
    pub name: &'static str,
    pub description: &'static str,
    /// Whether the program injects crashes and expects to be re-run after each reboot.
    pub injects_crashes: bool,
}

/// Registry of guest test programs.
pub const GUEST_TESTS: &[GuestTestInfo] = &[
    GuestTestInfo {
        id: GuestTestId::ModificationWorkload,
        name: "lab5test_a",
        description: "File modification and concurrent four-file workload without crash injection.",
        injects_crashes: false,
    },
    GuestTestInfo {
        id: GuestTestId::CrashRecovery,
        name: "lab5test_b",
        description: "Writes a three-block file while the kernel crashes after N block writes, N growing per boot.",
        injects_crashes: true,
    },
];

/// Look up a guest test by the program name typed at the guest shell.
pub fn lookup(name: &str) -> Option<&'static GuestTestInfo> {
    GUEST_TESTS.iter().find(|t| t.name == name)
}

/// Build the marker a test prints on success, e.g. `lab5test_b passed!`.
pub fn pass_marker(test_name: &str) -> String {
    format!("{test_name}{PASS_SUFFIX}")
}

/// Build the newline-terminated line typed at the guest shell to start a test.
pub fn command_line(test_name: &str) -> String {
    format!("{test_name}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pass_marker() {
        assert_eq!(pass_marker(DEFAULT_TEST_NAME), "lab5test_b passed!");
    }

    #[test]
    fn test_command_line_is_newline_terminated() {
        assert_eq!(command_line("lab5test_b"), "lab5test_b\n");
    }

    #[test]
    fn test_lookup() {
        let info = lookup("lab5test_b").unwrap();
        assert_eq!(info.id, GuestTestId::CrashRecovery);
        assert!(info.injects_crashes);
        assert!(!lookup("lab5test_a").unwrap().injects_crashes);
        assert!(lookup("usertests").is_none());
    }
}
