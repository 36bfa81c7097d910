//! Cross-field and domain consistency checks over the three zone forms.
//!
//! Validation is exhaustive: every violation is collected so the UI can
//! highlight all offending fields in one pass. Errors are data, never `Err`.

use serde::Serialize;

use crate::clock::parse_time_of_day;
use crate::forms::{ClimateFormState, FormKind, LightingFormState, WaterFormState, ZoneAutomationForms};
use crate::ranges::{self, FieldRange};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub form: FormKind,
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn errors_for(&self, form: FormKind) -> impl Iterator<Item = &FieldError> {
        self.errors.iter().filter(move |e| e.form == form)
    }

    /// `form.field` paths of every offending field, deduplicated, in report
    /// order.
    pub fn fields(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for e in &self.errors {
            let path = format!("{}.{}", e.form, e.field);
            if !out.contains(&path) {
                out.push(path);
            }
        }
        out
    }
}

/// Check all three forms. Deterministic and side-effect free.
pub fn validate_forms(forms: &ZoneAutomationForms) -> ValidationReport {
    let mut errors = Vec::new();

    validate_climate(&forms.climate, &mut Errors::new(FormKind::Climate, &mut errors));
    validate_water(&forms.water, &mut Errors::new(FormKind::Water, &mut errors));
    validate_lighting(&forms.lighting, &mut Errors::new(FormKind::Lighting, &mut errors));

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

// ---------------------------------------------------------------------------
// Error sink
// ---------------------------------------------------------------------------

struct Errors<'a> {
    form: FormKind,
    out: &'a mut Vec<FieldError>,
}

impl<'a> Errors<'a> {
    fn new(form: FormKind, out: &'a mut Vec<FieldError>) -> Self {
        Self { form, out }
    }

    fn push(&mut self, field: &'static str, message: String) {
        self.out.push(FieldError {
            form: self.form,
            field,
            message,
        });
    }

    fn in_range(&mut self, field: &'static str, value: f64, range: FieldRange) {
        if !range.contains(value) {
            self.push(field, format!("{field} {value} out of range {range}"));
        }
    }

    fn finite(&mut self, field: &'static str, value: f64) -> bool {
        if !value.is_finite() {
            self.push(field, format!("{field} must be a finite number, got {value}"));
        }
        value.is_finite()
    }

    fn non_negative(&mut self, field: &'static str, value: f64) {
        if self.finite(field, value) && value < 0.0 {
            self.push(field, format!("{field} must not be negative, got {value}"));
        }
    }

    fn positive(&mut self, field: &'static str, value: f64) {
        if self.finite(field, value) && value <= 0.0 {
            self.push(field, format!("{field} must be positive, got {value}"));
        }
    }

    fn time_of_day(&mut self, field: &'static str, value: &str) -> Option<time::Time> {
        let parsed = parse_time_of_day(value);
        if parsed.is_none() {
            self.push(field, format!("{field} '{value}' is not a HH:MM time"));
        }
        parsed
    }
}

// ---------------------------------------------------------------------------
// Per-form rules
// ---------------------------------------------------------------------------

fn validate_climate(c: &ClimateFormState, e: &mut Errors<'_>) {
    // ── Setpoints ───────────────────────────────────────────────
    e.in_range("day_temp", c.day_temp, ranges::AIR_TEMP_C);
    e.in_range("night_temp", c.night_temp, ranges::AIR_TEMP_C);
    e.in_range("day_humidity", c.day_humidity, ranges::AIR_HUMIDITY_PERCENT);
    e.in_range("night_humidity", c.night_humidity, ranges::AIR_HUMIDITY_PERCENT);
    e.positive("interval_minutes", f64::from(c.interval_minutes));

    // ── Day/night schedule ──────────────────────────────────────
    e.time_of_day("day_start", &c.day_start);
    e.time_of_day("night_start", &c.night_start);

    // ── Ventilation ─────────────────────────────────────────────
    e.in_range("vent_min_percent", c.vent_min_percent, ranges::VENT_PERCENT);
    e.in_range("vent_max_percent", c.vent_max_percent, ranges::VENT_PERCENT);
    if c.vent_min_percent > c.vent_max_percent {
        e.push(
            "vent_min_percent",
            format!(
                "vent_min_percent ({}) must not exceed vent_max_percent ({})",
                c.vent_min_percent, c.vent_max_percent
            ),
        );
    }

    // ── Outside conditions ──────────────────────────────────────
    // Serialized whatever the toggle says, so they must be finite.
    let bounds_finite = e.finite("outside_temp_min", c.outside_temp_min)
        & e.finite("outside_temp_max", c.outside_temp_max);
    if e.finite("outside_humidity_max", c.outside_humidity_max) && c.use_external_telemetry {
        e.in_range("outside_humidity_max", c.outside_humidity_max, ranges::OUTSIDE_HUMIDITY_PERCENT);
    }
    if c.use_external_telemetry && bounds_finite && c.outside_temp_min > c.outside_temp_max {
        e.push(
            "outside_temp_min",
            format!(
                "outside_temp_min ({}) must not exceed outside_temp_max ({})",
                c.outside_temp_min, c.outside_temp_max
            ),
        );
    }

    // ── Override ────────────────────────────────────────────────
    if c.manual_override_enabled {
        e.positive("override_minutes", f64::from(c.override_minutes));
    }
}

fn validate_water(w: &WaterFormState, e: &mut Errors<'_>) {
    // ── Tank layout ─────────────────────────────────────────────
    if w.tanks_count == 0 {
        e.push("tanks_count", "tanks_count must be at least 1".into());
    }
    e.non_negative("clean_tank_fill_l", w.clean_tank_fill_l);
    e.non_negative("nutrient_tank_target_l", w.nutrient_tank_target_l);
    e.non_negative("irrigation_batch_l", w.irrigation_batch_l);
    if w.irrigation_batch_l.is_finite()
        && w.nutrient_tank_target_l.is_finite()
        && w.irrigation_batch_l > w.nutrient_tank_target_l
    {
        e.push(
            "irrigation_batch_l",
            format!(
                "irrigation_batch_l ({}) exceeds nutrient_tank_target_l ({})",
                w.irrigation_batch_l, w.nutrient_tank_target_l
            ),
        );
    }

    // ── Tank fill ───────────────────────────────────────────────
    e.in_range("fill_temperature_c", w.fill_temperature_c, ranges::FILL_TEMP_C);

    // Same-day windows only.
    let start = e.time_of_day("fill_window_start", &w.fill_window_start);
    let end = e.time_of_day("fill_window_end", &w.fill_window_end);
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            e.push(
                "fill_window_start",
                format!(
                    "fill_window_start ({}) must be earlier than fill_window_end ({}); \
                     windows crossing midnight are not supported",
                    w.fill_window_start.trim(),
                    w.fill_window_end.trim()
                ),
            );
        }
    }

    // ── Solution ────────────────────────────────────────────────
    e.in_range("target_ph", w.target_ph, ranges::SOLUTION_PH);
    e.non_negative("target_ec", w.target_ec);
    if e.finite("drain_target_percent", w.drain_target_percent) && w.enable_drain_control {
        e.in_range("drain_target_percent", w.drain_target_percent, ranges::DRAIN_PERCENT);
    }

    // ── Refill workflow ─────────────────────────────────────────
    if w.cycle_start_workflow_enabled {
        let threshold = w.clean_tank_full_threshold;
        if e.finite("clean_tank_full_threshold", threshold) && !(threshold > 0.0 && threshold <= 1.0) {
            e.push(
                "clean_tank_full_threshold",
                format!("clean_tank_full_threshold {threshold} out of range (0, 1]"),
            );
        }
        e.positive("refill_duration_seconds", f64::from(w.refill_duration_seconds));
        e.positive("refill_timeout_seconds", f64::from(w.refill_timeout_seconds));
        if w.refill_duration_seconds > 0
            && w.refill_timeout_seconds > 0
            && w.refill_timeout_seconds <= w.refill_duration_seconds
        {
            e.push(
                "refill_timeout_seconds",
                format!(
                    "refill_timeout_seconds ({}) must exceed refill_duration_seconds ({})",
                    w.refill_timeout_seconds, w.refill_duration_seconds
                ),
            );
        }
    }

    // ── Solution change ─────────────────────────────────────────
    if w.solution_change_enabled {
        e.positive(
            "solution_change_interval_minutes",
            f64::from(w.solution_change_interval_minutes),
        );
        e.positive(
            "solution_change_duration_seconds",
            f64::from(w.solution_change_duration_seconds),
        );
    }
}

fn validate_lighting(l: &LightingFormState, e: &mut Errors<'_>) {
    // lux_day >= lux_night is deliberately not required.
    e.non_negative("lux_day", l.lux_day);
    e.non_negative("lux_night", l.lux_night);
    e.in_range("hours_on", l.hours_on, ranges::HOURS_ON);

    let start = e.time_of_day("schedule_start", &l.schedule_start);
    let end = e.time_of_day("schedule_end", &l.schedule_end);
    if let (Some(start), Some(end)) = (start, end) {
        if start == end {
            e.push(
                "schedule_end",
                format!("schedule_end must differ from schedule_start ({})", l.schedule_start.trim()),
            );
        }
    }

    e.in_range("manual_intensity", l.manual_intensity, ranges::MANUAL_INTENSITY_PERCENT);
    if let Some(hours) = l.manual_duration_hours {
        e.positive("manual_duration_hours", hours);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
