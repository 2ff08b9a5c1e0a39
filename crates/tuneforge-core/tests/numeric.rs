// crates/tuneforge-core/tests/numeric.rs
// ============================================================================
// Module: Numeric Utility Tests
// Description: Validate page alignment, clamping, and the generalized mean.
// Purpose: Pin the numeric helper contracts the engines depend on.
// Dependencies: tuneforge-core
// ============================================================================

//! Unit tests for the pure numeric helpers.

use tuneforge_core::runtime::cap;
use tuneforge_core::runtime::cap_with_redirect;
use tuneforge_core::runtime::generalized_mean;
use tuneforge_core::runtime::realign;

#[test]
fn realign_brackets_unaligned_values() {
    let (lower, upper) = realign(100_000, 8192);
    assert_eq!(lower, 98_304);
    assert_eq!(upper, 106_496);
    assert_eq!(upper - lower, 8192);
}

#[test]
fn realign_returns_aligned_values_unchanged() {
    let (lower, upper) = realign(16_384, 8192);
    assert_eq!(lower, 16_384);
    assert_eq!(upper, 16_384);
}

#[test]
fn realign_zero_page_is_identity() {
    assert_eq!(realign(12_345, 0), (12_345, 12_345));
}

#[test]
fn realign_zero_value_is_aligned() {
    assert_eq!(realign(0, 8192), (0, 0));
}

#[test]
fn cap_clamps_both_bounds() {
    assert_eq!(cap(5.0, 0.0, 10.0), 5.0);
    assert_eq!(cap(-1.0, 0.0, 10.0), 0.0);
    assert_eq!(cap(11.0, 0.0, 10.0), 10.0);
}

#[test]
fn cap_with_redirect_substitutes_violations() {
    assert_eq!(cap_with_redirect(5.0, 0.0, 10.0, -99.0, 99.0), 5.0);
    assert_eq!(cap_with_redirect(-1.0, 0.0, 10.0, -99.0, 99.0), -99.0);
    assert_eq!(cap_with_redirect(11.0, 0.0, 10.0, -99.0, 99.0), 99.0);
}

#[test]
fn generalized_mean_power_one_is_arithmetic() {
    let mean = generalized_mean(&[2.0, 4.0, 6.0], 1.0);
    assert_eq!(mean, Some(4.0));
}

#[test]
fn generalized_mean_power_zero_is_geometric() {
    let Some(mean) = generalized_mean(&[2.0, 8.0], 0.0) else {
        unreachable!("positive inputs must yield a geometric mean");
    };
    assert!((mean - 4.0).abs() < 1e-9);
}

#[test]
fn generalized_mean_rejects_nonpositive_geometric_inputs() {
    assert_eq!(generalized_mean(&[2.0, 0.0], 0.0), None);
    assert_eq!(generalized_mean(&[2.0, -3.0], 0.0), None);
}

#[test]
fn generalized_mean_rejects_empty_input() {
    assert_eq!(generalized_mean(&[], 1.0), None);
    assert_eq!(generalized_mean(&[], 0.0), None);
}

#[test]
fn generalized_mean_large_power_tracks_maximum() {
    let Some(mean) = generalized_mean(&[1.0, 2.0, 10.0], 8.0) else {
        unreachable!("finite inputs must yield a power mean");
    };
    assert!(mean > 2.0);
    assert!(mean <= 10.0);
}
