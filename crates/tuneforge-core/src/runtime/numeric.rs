// tuneforge-core/src/runtime/numeric.rs
// ============================================================================
// Module: Numeric Utilities
// Description: Page alignment, clamping with redirect, generalized mean.
// Purpose: Pure numeric helpers shared by the resolver and the solver.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Stateless numeric helpers. `realign` brackets a value between page
//! multiples, `cap` clamps with optional redirection to alternative values,
//! and `generalized_mean` implements the power mean with the geometric-mean
//! limit at power zero.

// ============================================================================
// SECTION: Page Alignment
// ============================================================================

/// Brackets `value` between the nearest page multiples.
///
/// Returns `(lower, upper)` where both are multiples of `page_size`,
/// `lower <= value <= upper`, and `upper - lower == page_size` whenever
/// `value` is not already aligned. An already-aligned value returns itself
/// twice. A zero `page_size` is a degenerate identity and returns
/// `(value, value)`.
#[must_use]
pub const fn realign(value: u64, page_size: u64) -> (u64, u64) {
    if page_size == 0 {
        return (value, value);
    }
    let lower = (value / page_size) * page_size;
    if lower == value {
        (value, value)
    } else {
        (lower, lower.saturating_add(page_size))
    }
}

// ============================================================================
// SECTION: Clamping
// ============================================================================

/// Clamps `value` into `[floor, ceiling]`.
#[must_use]
pub fn cap(value: f64, floor: f64, ceiling: f64) -> f64 {
    value.clamp(floor, ceiling)
}

/// Clamps `value` into `[floor, ceiling]`, redirecting violations.
///
/// A value below the floor becomes `below` and a value above the ceiling
/// becomes `above`, instead of snapping to the violated bound. In-range
/// values pass through unchanged.
#[must_use]
pub fn cap_with_redirect(value: f64, floor: f64, ceiling: f64, below: f64, above: f64) -> f64 {
    if value < floor {
        below
    } else if value > ceiling {
        above
    } else {
        value
    }
}

// ============================================================================
// SECTION: Generalized Mean
// ============================================================================

/// Computes the power mean of `values` with exponent `power`.
///
/// `power == 0` yields the geometric-mean limit, which requires strictly
/// positive inputs. Returns `None` for an empty slice or when the inputs are
/// outside the mean's domain.
#[must_use]
pub fn generalized_mean(values: &[f64], power: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(
        clippy::cast_precision_loss,
        reason = "Input slices are far smaller than the f64 mantissa limit."
    )]
    let count = values.len() as f64;
    if power == 0.0 {
        if values.iter().any(|value| *value <= 0.0) {
            return None;
        }
        let log_sum: f64 = values.iter().map(|value| value.ln()).sum();
        return Some((log_sum / count).exp());
    }
    let power_sum: f64 = values.iter().map(|value| value.powf(power)).sum();
    let mean = (power_sum / count).powf(1.0 / power);
    mean.is_finite().then_some(mean)
}
