// crates/tuneforge-core/tests/proptest_numeric.rs
// ============================================================================
// Module: Numeric Property-Based Tests
// Description: Property tests for page-alignment invariants.
// Purpose: Detect bracketing violations across wide input ranges.
// ============================================================================

//! Property-based tests for the numeric helpers.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use tuneforge_core::runtime::cap;
use tuneforge_core::runtime::realign;

proptest! {
    #[test]
    fn realign_brackets_the_value(value in 0_u64 .. 1 << 40, page in 1_u64 .. 1 << 20) {
        let (lower, upper) = realign(value, page);
        prop_assert!(lower <= value);
        prop_assert!(value <= upper);
        prop_assert_eq!(lower % page, 0);
        prop_assert_eq!(upper % page, 0);
        if value % page == 0 {
            prop_assert_eq!(lower, value);
            prop_assert_eq!(upper, value);
        } else {
            prop_assert_eq!(upper - lower, page);
        }
    }

    #[test]
    fn realign_of_a_page_multiple_is_fixed(k in 0_u64 .. 1 << 20, page in 1_u64 .. 1 << 20) {
        let aligned = k * page;
        prop_assert_eq!(realign(aligned, page), (aligned, aligned));
    }

    #[test]
    fn cap_result_is_always_inside_the_bounds(
        value in -1e12_f64 .. 1e12,
        floor in -1e6_f64 .. 0.0,
        span in 0.0_f64 .. 1e6,
    ) {
        let ceiling = floor + span;
        let capped = cap(value, floor, ceiling);
        prop_assert!(capped >= floor);
        prop_assert!(capped <= ceiling);
    }
}
