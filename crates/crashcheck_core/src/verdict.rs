//! Verdict classification for a captured console buffer.
//!
//! ## Rules
//!
//! Checks run in a fixed order and the first match wins:
//!
//! 1. the buffer contains [`INCONSISTENT_MARKER`] → [`Verdict::NotCrashSafe`]
//! 2. the buffer contains the test's pass marker → [`Verdict::CrashSafe`]
//! 3. otherwise → [`Verdict::Unfinished`]
//!
//! A buffer holding both markers therefore resolves to `NotCrashSafe`. `Unfinished` deliberately covers both a
//! timeout before the guest finished and output the rules do not recognize.

use std::fmt;

use crate::markers::{DEFAULT_TEST_NAME, INCONSISTENT_MARKER, pass_marker};

/// Outcome of one crash-safety run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    NotCrashSafe,
    CrashSafe,
    Unfinished,
}

impl Verdict {
    /// All verdicts, in rule order.
    pub const ALL: [Verdict; 3] = [Verdict::NotCrashSafe, Verdict::CrashSafe, Verdict::Unfinished];

    /// Return the line printed for this verdict.
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::NotCrashSafe => "file system is not crash-safe",
            Verdict::CrashSafe => "file system is crash-safe",
            Verdict::Unfinished => "test is not finished yet!",
        }
    }

    /// Whether the guest reached a conclusion (either way).
    pub fn is_conclusive(self) -> bool {
        !matches!(self, Verdict::Unfinished)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verdict together with the console line that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    /// First console line containing the matched marker; `None` for [`Verdict::Unfinished`].
    pub evidence: Option<String>,
}

/// Classify a buffer against the default test's pass marker.
///
/// ## Examples
/// ```rust
/// use crashcheck_core::{Verdict, classify};
///
/// assert_eq!(classify("lab5test_b passed!\n").verdict, Verdict::CrashSafe);
/// assert_eq!(classify("").verdict, Verdict::Unfinished);
/// ```
pub fn classify(buffer: &str) -> Classification {
    classify_with(buffer, &pass_marker(DEFAULT_TEST_NAME))
}

/// Classify a buffer against an explicit pass marker.
///
/// ## Parameters
/// - `buffer`: the full captured console output.
/// - `pass_marker`: the line fragment the test prints on success (see [`pass_marker`]).
pub fn classify_with(buffer: &str, pass_marker: &str) -> Classification {
    if buffer.contains(INCONSISTENT_MARKER) {
        return Classification {
            verdict: Verdict::NotCrashSafe,
            evidence: evidence_line(buffer, INCONSISTENT_MARKER),
        };
    }
    if !pass_marker.is_empty() && buffer.contains(pass_marker) {
        return Classification {
            verdict: Verdict::CrashSafe,
            evidence: evidence_line(buffer, pass_marker),
        };
    }
    Classification {
        verdict: Verdict::Unfinished,
        evidence: None,
    }
}

fn evidence_line(buffer: &str, marker: &str) -> Option<String> {
    buffer
        .lines()
        .find(|line| line.contains(marker))
        .map(|line| line.trim_end_matches('\r').to_string())
}
