//! Property-based tests for capture classification
//!
//! The capture is raw emulator output: arbitrary bytes, possibly cut mid-line or mid-codepoint when the
//! emulator is killed. Classification must stay total and keep its rule order on any input.

use crashcheck::harness::classify_bytes;
use crashcheck::Verdict;
use proptest::prelude::*;

const PASS: &str = "lab5test_b passed!";

proptest! {
    /// Property: any byte soup classifies without panicking, and only to Unfinished unless a marker is present.
    #[test]
    fn arbitrary_bytes_are_total(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let text = String::from_utf8_lossy(&bytes);
        let verdict = classify_bytes(&bytes, PASS).verdict;
        if !text.contains("consistent") && !text.contains(PASS) {
            prop_assert_eq!(verdict, Verdict::Unfinished);
        }
    }

    /// Property: invalid UTF-8 around the pass marker does not hide it.
    #[test]
    fn invalid_utf8_does_not_hide_markers(
        head in proptest::collection::vec(0x80u8..0xff, 0..32),
        tail in proptest::collection::vec(0x80u8..0xff, 0..32),
    ) {
        let mut bytes = head.clone();
        bytes.extend_from_slice(b"\nlab5test_b passed!\n");
        bytes.extend_from_slice(&tail);
        prop_assert_eq!(classify_bytes(&bytes, PASS).verdict, Verdict::CrashSafe);

        let mut bytes = head;
        bytes.extend_from_slice(b"\nnot in consistent state!\nlab5test_b passed!\n");
        bytes.extend_from_slice(&tail);
        prop_assert_eq!(classify_bytes(&bytes, PASS).verdict, Verdict::NotCrashSafe);
    }
}

#[test]
fn truncated_marker_is_unfinished() {
    // Emulator killed halfway through printing the pass line.
    assert_eq!(classify_bytes(b"lab5test_b starting\nlab5test_b pas", PASS).verdict, Verdict::Unfinished);
}

#[test]
fn verdict_lines() {
    insta::assert_snapshot!(Verdict::NotCrashSafe.to_string(), @"file system is not crash-safe");
    insta::assert_snapshot!(Verdict::CrashSafe.to_string(), @"file system is crash-safe");
    insta::assert_snapshot!(Verdict::Unfinished.to_string(), @"test is not finished yet!");
}
