//! Layering guardrails to keep the verdict core free of IO and third-party dependencies.
//!
//! `crashcheck_core` must stay a pure vocabulary crate: this test scans its `Cargo.toml` and fails if anything
//! appears in `[dependencies]`.

#[test]
fn core_crate_has_no_dependencies() {
    let manifest = include_str!("../crates/crashcheck_core/Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        panic!("`crashcheck_core` must not have dependencies, found: {line}");
    }
}

#[test]
fn core_crate_does_no_io() {
    let sources = [
        include_str!("../crates/crashcheck_core/src/lib.rs"),
        include_str!("../crates/crashcheck_core/src/markers.rs"),
        include_str!("../crates/crashcheck_core/src/verdict.rs"),
    ];
    for source in sources {
        for forbidden in ["std::fs", "std::process", "std::io", "std::net"] {
            assert!(!source.contains(forbidden), "core crate references {forbidden}");
        }
    }
}
