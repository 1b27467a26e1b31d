#![forbid(unsafe_code)]
//! crashcheck: crash-safety harness for the lab5 file system
//!
//! The file system under test lives in an external xv6-style kernel tree. This crate rebuilds that tree, boots
//! it under the emulator, keeps typing the crash-recovery test command at the guest shell, and classifies the
//! captured console into one of three verdicts.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness`
//!   modules enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod harness;
pub mod version;

pub use config::HarnessConfig;
pub use crashcheck_core::{Classification, Verdict, classify, classify_with};
pub use harness::{Harness, HarnessError, RunReport};
