//! Inclusive range clamping used by every recipe-derived field.

/// Clamp `value` into the inclusive range `[min, max]`.
///
/// A NaN `value` clamps to `min` so a garbage input can never escape the
/// range.
///
/// # Panics
///
/// Debug builds panic when `min > max` or either bound is NaN. Release builds
/// return `value` untouched in that case; the bounds used by this crate come
/// from the fixed tables in [`crate::ranges`] and never trip it.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    debug_assert!(min <= max, "clamp: min ({min}) must not exceed max ({max})");
    if !(min <= max) {
        return value;
    }

    if value.is_nan() || value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

// ===========================================================================
// Tests
// ===========================================================================
