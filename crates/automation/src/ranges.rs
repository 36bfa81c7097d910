//! Domain-range table for every recipe-controlled field.
//!
//! The recipe applier, the recommended-defaults resetter and the validator
//! all read their bounds from here so "merge", "reset" and "check" can never
//! disagree about what a valid value is.

use std::fmt;

use crate::clamp::clamp;

/// Inclusive `[min, max]` bound pair for one form field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        clamp(value, self.min, self.max)
    }

    /// Clamp and round to a whole number for minute/second/count fields.
    pub fn clamp_whole(&self, value: f64) -> u32 {
        // Whole-number ranges are non-negative, so the cast cannot wrap.
        self.clamp(value).round() as u32
    }

    /// `false` for NaN.
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl fmt::Display for FieldRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// Climate
// ---------------------------------------------------------------------------

/// Plant-safe air temperature, day and night alike.
pub const AIR_TEMP_C: FieldRange = FieldRange::new(10.0, 35.0);
pub const AIR_HUMIDITY_PERCENT: FieldRange = FieldRange::new(30.0, 90.0);
pub const CLIMATE_INTERVAL_MIN: FieldRange = FieldRange::new(1.0, 1440.0);
pub const VENT_PERCENT: FieldRange = FieldRange::new(0.0, 100.0);
pub const OUTSIDE_HUMIDITY_PERCENT: FieldRange = FieldRange::new(0.0, 100.0);

// ---------------------------------------------------------------------------
// Water
// ---------------------------------------------------------------------------

/// Horticultural pH window for hydroponic nutrient solution.
pub const SOLUTION_PH: FieldRange = FieldRange::new(4.0, 9.0);
/// Electrical conductivity, mS/cm.
pub const SOLUTION_EC: FieldRange = FieldRange::new(0.0, 10.0);
pub const IRRIGATION_INTERVAL_MIN: FieldRange = FieldRange::new(5.0, 1440.0);
pub const IRRIGATION_DURATION_SEC: FieldRange = FieldRange::new(1.0, 3600.0);
pub const FILL_TEMP_C: FieldRange = FieldRange::new(5.0, 35.0);
pub const DRAIN_PERCENT: FieldRange = FieldRange::new(0.0, 100.0);

// ---------------------------------------------------------------------------
// Lighting
// ---------------------------------------------------------------------------

pub const LUX: FieldRange = FieldRange::new(0.0, 120_000.0);
pub const HOURS_ON: FieldRange = FieldRange::new(0.0, 24.0);
pub const LIGHTING_INTERVAL_MIN: FieldRange = FieldRange::new(1.0, 1440.0);
pub const MANUAL_INTENSITY_PERCENT: FieldRange = FieldRange::new(0.0, 100.0);

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[FieldRange] = &[
        AIR_TEMP_C,
        AIR_HUMIDITY_PERCENT,
        CLIMATE_INTERVAL_MIN,
        VENT_PERCENT,
        OUTSIDE_HUMIDITY_PERCENT,
        SOLUTION_PH,
        SOLUTION_EC,
        IRRIGATION_INTERVAL_MIN,
        IRRIGATION_DURATION_SEC,
        FILL_TEMP_C,
        DRAIN_PERCENT,
        LUX,
        HOURS_ON,
        LIGHTING_INTERVAL_MIN,
        MANUAL_INTENSITY_PERCENT,
    ];

    #[test]
    fn every_range_is_well_formed() {
        for r in ALL {
            assert!(r.min <= r.max, "inverted range {r}");
            assert!(r.min.is_finite() && r.max.is_finite(), "unbounded range {r}");
        }
    }

    #[test]
    fn clamp_whole_rounds_after_clamping() {
        assert_eq!(IRRIGATION_INTERVAL_MIN.clamp_whole(29.6), 30);
        assert_eq!(IRRIGATION_INTERVAL_MIN.clamp_whole(1.0), 5);
        assert_eq!(IRRIGATION_INTERVAL_MIN.clamp_whole(1e7), 1440);
        assert_eq!(IRRIGATION_INTERVAL_MIN.clamp_whole(f64::NAN), 5);
    }

    #[test]
    fn contains_rejects_nan() {
        assert!(!SOLUTION_PH.contains(f64::NAN));
        assert!(SOLUTION_PH.contains(4.0));
        assert!(SOLUTION_PH.contains(9.0));
    }

    #[test]
    fn display_shows_bounds() {
        assert_eq!(HOURS_ON.to_string(), "[0, 24]");
    }
}
