//! Provide the console vocabulary and verdict rules shared by the crashcheck harness.
//!
//! This crate is intentionally small and dependency-free. It answers one question: given the text a guest kernel
//! printed to its console, what did the crash-safety test conclude?
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no process handling, no global state.
//! - Current scope: the marker registry ([`markers`]) and the three-way verdict ([`verdict`]).

pub mod markers;
pub mod verdict;

pub use markers::{DEFAULT_TEST_NAME, INCONSISTENT_MARKER, command_line, pass_marker};
pub use verdict::{Classification, Verdict, classify, classify_with};
