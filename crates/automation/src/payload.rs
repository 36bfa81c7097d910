//! Growth-cycle configuration payload: the wire contract the backend's
//! growth-cycle endpoint consumes.
//!
//! The builder does not validate. It serialises whatever the forms hold,
//! normalising text fields on the way out. Toggled-off sections keep their
//! last values; the backend reads the toggle, not field presence.

use serde::Serialize;

use crate::clock;
use crate::forms::{ClimateFormState, LightingFormState, SystemType, WaterFormState, ZoneAutomationForms};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthCycleConfigPayload {
    pub climate: ClimatePayload,
    pub water: WaterPayload,
    pub lighting: LightingPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimatePayload {
    pub day_temp: f64,
    pub night_temp: f64,
    pub day_humidity: f64,
    pub night_humidity: f64,
    pub interval_minutes: u32,
    pub day_start: String,
    pub night_start: String,
    pub vent_min_percent: f64,
    pub vent_max_percent: f64,
    pub use_external_telemetry: bool,
    pub outside_temp_min: f64,
    pub outside_temp_max: f64,
    pub outside_humidity_max: f64,
    pub manual_override_enabled: bool,
    pub override_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterPayload {
    pub system_type: SystemType,
    pub tanks_count: u32,
    pub clean_tank_fill_l: f64,
    pub nutrient_tank_target_l: f64,
    pub irrigation_batch_l: f64,
    pub interval_minutes: u32,
    pub duration_seconds: u32,
    pub fill_temperature_c: f64,
    pub fill_window_start: String,
    pub fill_window_end: String,
    pub target_ph: f64,
    pub target_ec: f64,
    pub valve_switching: bool,
    pub correction_during_irrigation: bool,
    pub enable_drain_control: bool,
    pub drain_target_percent: f64,
    pub diagnostics_enabled: bool,
    pub diagnostics_interval_minutes: u32,
    pub cycle_start_workflow_enabled: bool,
    pub clean_tank_full_threshold: f64,
    pub refill_duration_seconds: u32,
    pub refill_timeout_seconds: u32,
    pub refill_required_node_types: Vec<String>,
    pub refill_preferred_channel: String,
    pub solution_change_enabled: bool,
    pub solution_change_interval_minutes: u32,
    pub solution_change_duration_seconds: u32,
    pub manual_irrigation_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightingPayload {
    pub lux_day: f64,
    pub lux_night: f64,
    pub hours_on: f64,
    pub interval_minutes: u32,
    pub schedule_start: String,
    pub schedule_end: String,
    pub manual_intensity: f64,
    pub manual_duration_hours: Option<f64>,
}

/// Assemble the payload. Callers are expected to have run
/// [`crate::validate::validate_forms`] first.
pub fn build_growth_cycle_config_payload(forms: &ZoneAutomationForms) -> GrowthCycleConfigPayload {
    GrowthCycleConfigPayload {
        climate: climate_payload(&forms.climate),
        water: water_payload(&forms.water),
        lighting: lighting_payload(&forms.lighting),
    }
}

fn climate_payload(c: &ClimateFormState) -> ClimatePayload {
    ClimatePayload {
        day_temp: c.day_temp,
        night_temp: c.night_temp,
        day_humidity: c.day_humidity,
        night_humidity: c.night_humidity,
        interval_minutes: c.interval_minutes,
        day_start: time_field(&c.day_start),
        night_start: time_field(&c.night_start),
        vent_min_percent: c.vent_min_percent,
        vent_max_percent: c.vent_max_percent,
        use_external_telemetry: c.use_external_telemetry,
        outside_temp_min: c.outside_temp_min,
        outside_temp_max: c.outside_temp_max,
        outside_humidity_max: c.outside_humidity_max,
        manual_override_enabled: c.manual_override_enabled,
        override_minutes: c.override_minutes,
    }
}

fn water_payload(w: &WaterFormState) -> WaterPayload {
    WaterPayload {
        system_type: w.system_type,
        tanks_count: w.tanks_count,
        clean_tank_fill_l: w.clean_tank_fill_l,
        nutrient_tank_target_l: w.nutrient_tank_target_l,
        irrigation_batch_l: w.irrigation_batch_l,
        interval_minutes: w.interval_minutes,
        duration_seconds: w.duration_seconds,
        fill_temperature_c: w.fill_temperature_c,
        fill_window_start: time_field(&w.fill_window_start),
        fill_window_end: time_field(&w.fill_window_end),
        target_ph: w.target_ph,
        target_ec: w.target_ec,
        valve_switching: w.valve_switching,
        correction_during_irrigation: w.correction_during_irrigation,
        enable_drain_control: w.enable_drain_control,
        drain_target_percent: w.drain_target_percent,
        diagnostics_enabled: w.diagnostics_enabled,
        diagnostics_interval_minutes: w.diagnostics_interval_minutes,
        cycle_start_workflow_enabled: w.cycle_start_workflow_enabled,
        clean_tank_full_threshold: w.clean_tank_full_threshold,
        refill_duration_seconds: w.refill_duration_seconds,
        refill_timeout_seconds: w.refill_timeout_seconds,
        refill_required_node_types: node_types(&w.refill_required_node_types),
        refill_preferred_channel: w.refill_preferred_channel.trim().to_string(),
        solution_change_enabled: w.solution_change_enabled,
        solution_change_interval_minutes: w.solution_change_interval_minutes,
        solution_change_duration_seconds: w.solution_change_duration_seconds,
        manual_irrigation_seconds: w.manual_irrigation_seconds,
    }
}

fn lighting_payload(l: &LightingFormState) -> LightingPayload {
    LightingPayload {
        lux_day: l.lux_day,
        lux_night: l.lux_night,
        hours_on: l.hours_on,
        interval_minutes: l.interval_minutes,
        schedule_start: time_field(&l.schedule_start),
        schedule_end: time_field(&l.schedule_end),
        manual_intensity: l.manual_intensity,
        manual_duration_hours: l.manual_duration_hours,
    }
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

/// Canonical `HH:MM` when parseable, otherwise the trimmed input as-is.
fn time_field(raw: &str) -> String {
    clock::normalize(raw).unwrap_or_else(|| raw.trim().to_string())
}

/// `" irrig, PH ,,ph"` → `["irrig", "ph"]`: trimmed, lowercased, blanks and
/// repeats dropped, first-seen order kept.
fn node_types(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in raw.split(',').map(|t| t.trim().to_ascii_lowercase()) {
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{reset_to_recommended, Recipe};

    fn keys(v: &serde_json::Value) -> Vec<String> {
        v.as_object().unwrap().keys().cloned().collect()
    }

    #[test]
    fn payload_carries_every_form_field() {
        let recipe = Recipe::from_json(r#"{"climate":{"day_temp":25},"water":{"system_type":"nft"}}"#)
            .unwrap();
        let forms = reset_to_recommended(&recipe);
        let form_json = serde_json::to_value(&forms).unwrap();
        let payload_json = serde_json::to_value(build_growth_cycle_config_payload(&forms)).unwrap();

        assert_eq!(keys(&payload_json), keys(&form_json));
        for section in ["climate", "water", "lighting"] {
            let mut want = keys(&form_json[section]);
            let mut got = keys(&payload_json[section]);
            want.sort();
            got.sort();
            assert_eq!(got, want, "{section} keys differ");
        }
    }

    #[test]
    fn disabled_sections_keep_last_values() {
        let mut forms = ZoneAutomationForms::default();
        forms.climate.manual_override_enabled = false;
        forms.climate.override_minutes = 42;
        forms.water.solution_change_enabled = false;
        forms.water.solution_change_interval_minutes = 360;

        let p = build_growth_cycle_config_payload(&forms);
        assert!(!p.climate.manual_override_enabled);
        assert_eq!(p.climate.override_minutes, 42);
        assert_eq!(p.water.solution_change_interval_minutes, 360);
    }

    #[test]
    fn time_strings_are_trimmed_and_canonical() {
        let mut forms = ZoneAutomationForms::default();
        forms.climate.day_start = " 06:15:00 ".into();
        forms.water.fill_window_end = "  sometime ".into();

        let p = build_growth_cycle_config_payload(&forms);
        assert_eq!(p.climate.day_start, "06:15");
        assert_eq!(p.water.fill_window_end, "sometime");
    }

    #[test]
    fn node_types_become_a_clean_list() {
        assert_eq!(node_types(" irrig, PH ,,ph, ec "), vec!["irrig", "ph", "ec"]);
        assert!(node_types("  ").is_empty());
    }

    #[test]
    fn wire_shape_uses_backend_names() {
        let mut forms = ZoneAutomationForms::default();
        forms.water.system_type = SystemType::SubstrateTrays;
        forms.water.refill_preferred_channel = " fill_valve ".into();
        let json = serde_json::to_value(build_growth_cycle_config_payload(&forms)).unwrap();

        assert_eq!(json["water"]["system_type"], "substrate_trays");
        assert_eq!(json["water"]["refill_preferred_channel"], "fill_valve");
        assert_eq!(
            json["water"]["refill_required_node_types"],
            serde_json::json!(["irrig", "climate", "light"])
        );
        assert_eq!(json["lighting"]["manual_duration_hours"], serde_json::Value::Null);
        assert_eq!(json["climate"]["interval_minutes"], 5);
    }

    #[test]
    fn out_of_range_values_serialize_without_panicking() {
        let mut forms = ZoneAutomationForms::default();
        forms.climate.day_temp = f64::NAN;
        forms.water.irrigation_batch_l = 1e12;
        forms.lighting.hours_on = -3.0;

        let p = build_growth_cycle_config_payload(&forms);
        assert_eq!(p.water.irrigation_batch_l, 1e12);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["climate"]["day_temp"], serde_json::Value::Null);
        assert_eq!(json["lighting"]["hours_on"], -3.0);
    }

    #[test]
    fn builder_is_deterministic() {
        let forms = ZoneAutomationForms::default();
        assert_eq!(
            build_growth_cycle_config_payload(&forms),
            build_growth_cycle_config_payload(&forms)
        );
    }
}
