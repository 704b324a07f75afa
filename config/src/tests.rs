//! # Tests for Config Constants
//!
//! Cross-checks between the constants exported by this crate.

use crate::constants::*;

// =============================================================================
// PRECISION TESTS
// =============================================================================

#[test]
fn test_tolerance_is_positive() {
    assert!(EPSILON_TOLERANCE > 0.0, "EPSILON_TOLERANCE must be positive");
}

#[test]
fn test_approx_zero_respects_tolerance() {
    assert!(approx_zero(EPSILON_TOLERANCE / 2.0));
    assert!(!approx_zero(EPSILON_TOLERANCE * 2.0));
}

// =============================================================================
// LIMIT TESTS
// =============================================================================

#[test]
fn test_red_zone_fits_inside_stack() {
    assert!(STACKER_RED_ZONE_BYTES > 0);
    assert!(STACKER_RED_ZONE_BYTES < STACKER_STACK_SIZE_BYTES);
}

#[test]
fn test_recursion_depth_is_reasonable() {
    assert!(MAX_RECURSION_DEPTH >= 64);
    assert!(MAX_RECURSION_DEPTH <= 10_000);
}

// =============================================================================
// NAMING TESTS
// =============================================================================

#[test]
fn test_field_markers_are_distinct() {
    assert_ne!(MAPPED_FIELD_MARKER, UNIFORM_FIELD_MARKER);
    assert!(!MAPPED_FIELD_MARKER.contains(UNIFORM_FIELD_MARKER));
}
