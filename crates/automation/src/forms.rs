//! Form state for one zone-editing session: climate, water and lighting.
//!
//! The caller owns these values and binds them to its widgets. Every
//! function in this crate takes them by reference for the duration of a
//! single call and keeps nothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::lenient;

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

/// Which of the three sub-forms a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Climate,
    Water,
    Lighting,
}

impl FormKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Climate => "Climate",
            Self::Water => "Irrigation",
            Self::Lighting => "Lighting",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Climate => write!(f, "climate"),
            Self::Water => write!(f, "water"),
            Self::Lighting => write!(f, "lighting"),
        }
    }
}

/// Irrigation topology. Decides which tank-layout fields mean anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    /// Clean-water tank feeding a nutrient tank, drip emitters to waste.
    #[default]
    Drip,
    /// Tray-fed substrate; runoff has to be drained.
    SubstrateTrays,
    /// Nutrient film technique; one recirculating reservoir.
    Nft,
}

impl SystemType {
    pub const ALL: [SystemType; 3] = [Self::Drip, Self::SubstrateTrays, Self::Nft];

    pub fn label(self) -> &'static str {
        match self {
            Self::Drip => "Drip irrigation",
            Self::SubstrateTrays => "Substrate trays",
            Self::Nft => "NFT (nutrient film)",
        }
    }
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drip => write!(f, "drip"),
            Self::SubstrateTrays => write!(f, "substrate_trays"),
            Self::Nft => write!(f, "nft"),
        }
    }
}

impl FromStr for SystemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drip" => Ok(Self::Drip),
            "substrate_trays" | "substrate-trays" => Ok(Self::SubstrateTrays),
            "nft" => Ok(Self::Nft),
            other => Err(format!("unknown irrigation system type '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Climate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateFormState {
    #[serde(deserialize_with = "lenient::number")]
    pub day_temp: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub night_temp: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub day_humidity: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub night_humidity: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub interval_minutes: u32,
    /// `HH:MM` at which day setpoints take over.
    pub day_start: String,
    /// `HH:MM` at which night setpoints take over.
    pub night_start: String,
    #[serde(deserialize_with = "lenient::number")]
    pub vent_min_percent: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub vent_max_percent: f64,
    pub use_external_telemetry: bool,
    #[serde(deserialize_with = "lenient::number")]
    pub outside_temp_min: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub outside_temp_max: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub outside_humidity_max: f64,
    pub manual_override_enabled: bool,
    /// Only meaningful while `manual_override_enabled`.
    #[serde(deserialize_with = "lenient::number")]
    pub override_minutes: u32,
}

impl Default for ClimateFormState {
    fn default() -> Self {
        Self {
            day_temp: 23.0,
            night_temp: 19.0,
            day_humidity: 62.0,
            night_humidity: 70.0,
            interval_minutes: 5,
            day_start: "07:00".into(),
            night_start: "19:00".into(),
            vent_min_percent: 15.0,
            vent_max_percent: 75.0,
            use_external_telemetry: true,
            outside_temp_min: 4.0,
            outside_temp_max: 34.0,
            outside_humidity_max: 90.0,
            manual_override_enabled: false,
            override_minutes: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Water
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterFormState {
    pub system_type: SystemType,

    // ── Tank layout (owned by `layout::sync_system_to_tank_layout`) ──
    #[serde(deserialize_with = "lenient::number")]
    pub tanks_count: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub clean_tank_fill_l: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub nutrient_tank_target_l: f64,

    // ── Irrigation ──
    #[serde(deserialize_with = "lenient::number")]
    pub irrigation_batch_l: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub interval_minutes: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub duration_seconds: u32,

    // ── Tank fill ──
    #[serde(deserialize_with = "lenient::number")]
    pub fill_temperature_c: f64,
    pub fill_window_start: String,
    pub fill_window_end: String,

    // ── Solution targets ──
    #[serde(deserialize_with = "lenient::number")]
    pub target_ph: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub target_ec: f64,
    pub valve_switching: bool,
    pub correction_during_irrigation: bool,

    // ── Drain ──
    pub enable_drain_control: bool,
    #[serde(deserialize_with = "lenient::number")]
    pub drain_target_percent: f64,

    // ── Diagnostics ──
    pub diagnostics_enabled: bool,
    #[serde(deserialize_with = "lenient::number")]
    pub diagnostics_interval_minutes: u32,

    // ── Refill workflow at cycle start ──
    pub cycle_start_workflow_enabled: bool,
    /// Fraction of the clean tank, in `(0, 1]`, that counts as full.
    #[serde(deserialize_with = "lenient::number")]
    pub clean_tank_full_threshold: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub refill_duration_seconds: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub refill_timeout_seconds: u32,
    /// Comma-separated node types that must be online before refilling.
    pub refill_required_node_types: String,
    pub refill_preferred_channel: String,

    // ── Solution change ──
    pub solution_change_enabled: bool,
    #[serde(deserialize_with = "lenient::number")]
    pub solution_change_interval_minutes: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub solution_change_duration_seconds: u32,

    #[serde(deserialize_with = "lenient::number")]
    pub manual_irrigation_seconds: u32,
}

impl Default for WaterFormState {
    fn default() -> Self {
        let layout = SystemType::default().layout();
        Self {
            system_type: SystemType::default(),
            tanks_count: layout.tanks_count,
            clean_tank_fill_l: layout.clean_tank_fill_l,
            nutrient_tank_target_l: layout.nutrient_tank_target_l,
            irrigation_batch_l: 20.0,
            interval_minutes: 30,
            duration_seconds: 120,
            fill_temperature_c: 20.0,
            fill_window_start: "05:00".into(),
            fill_window_end: "07:00".into(),
            target_ph: 5.8,
            target_ec: 1.6,
            valve_switching: true,
            correction_during_irrigation: true,
            enable_drain_control: layout.drain_control,
            drain_target_percent: layout.drain_target_percent,
            diagnostics_enabled: true,
            diagnostics_interval_minutes: 15,
            cycle_start_workflow_enabled: true,
            clean_tank_full_threshold: 0.95,
            refill_duration_seconds: layout.refill_duration_seconds,
            refill_timeout_seconds: layout.refill_timeout_seconds,
            refill_required_node_types: "irrig,climate,light".into(),
            refill_preferred_channel: "fill_valve".into(),
            solution_change_enabled: false,
            solution_change_interval_minutes: 180,
            solution_change_duration_seconds: 120,
            manual_irrigation_seconds: 90,
        }
    }
}

// ---------------------------------------------------------------------------
// Lighting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingFormState {
    #[serde(deserialize_with = "lenient::number")]
    pub lux_day: f64,
    /// Night supplemental lighting is legitimate, so this may exceed
    /// `lux_day`.
    #[serde(deserialize_with = "lenient::number")]
    pub lux_night: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub hours_on: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub interval_minutes: u32,
    pub schedule_start: String,
    pub schedule_end: String,
    /// Percent of full output while manually overridden.
    #[serde(deserialize_with = "lenient::number")]
    pub manual_intensity: f64,
    #[serde(deserialize_with = "lenient::option_number")]
    pub manual_duration_hours: Option<f64>,
}

impl Default for LightingFormState {
    fn default() -> Self {
        Self {
            lux_day: 18_000.0,
            lux_night: 0.0,
            hours_on: 16.0,
            interval_minutes: 30,
            schedule_start: "06:00".into(),
            schedule_end: "22:00".into(),
            manual_intensity: 75.0,
            manual_duration_hours: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// The unit of validation and payload construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneAutomationForms {
    pub climate: ClimateFormState,
    pub water: WaterFormState,
    pub lighting: LightingFormState,
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_type_wire_names() {
        assert_eq!(serde_json::to_string(&SystemType::Drip).unwrap(), r#""drip""#);
        assert_eq!(
            serde_json::to_string(&SystemType::SubstrateTrays).unwrap(),
            r#""substrate_trays""#
        );
        assert_eq!(serde_json::to_string(&SystemType::Nft).unwrap(), r#""nft""#);
    }

    #[test]
    fn system_type_from_str_round_trips_display() {
        for t in SystemType::ALL {
            assert_eq!(t.to_string().parse::<SystemType>(), Ok(t));
        }
        assert_eq!(" NFT ".parse::<SystemType>(), Ok(SystemType::Nft));
        assert!("aeroponics".parse::<SystemType>().is_err());
    }

    #[test]
    fn labels_are_human_readable() {
        assert_eq!(SystemType::SubstrateTrays.label(), "Substrate trays");
        assert_eq!(FormKind::Water.label(), "Irrigation");
        assert_eq!(FormKind::Water.to_string(), "water");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let forms: ZoneAutomationForms =
            serde_json::from_str(r#"{"climate":{"day_temp":"25.5"},"water":{"tanks_count":"3"}}"#)
                .unwrap();
        assert_eq!(forms.climate.day_temp, 25.5);
        assert_eq!(forms.climate.night_temp, ClimateFormState::default().night_temp);
        assert_eq!(forms.water.tanks_count, 3);
        assert_eq!(forms.lighting, LightingFormState::default());
    }

    #[test]
    fn non_finite_numeric_text_is_rejected() {
        for json in [
            r#"{"climate":{"outside_temp_min":"NaN"}}"#,
            r#"{"climate":{"outside_humidity_max":"inf"}}"#,
            r#"{"water":{"nutrient_tank_target_l":"inf","clean_tank_fill_l":"infinity"}}"#,
            r#"{"lighting":{"manual_duration_hours":"nan"}}"#,
        ] {
            assert!(serde_json::from_str::<ZoneAutomationForms>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn unknown_system_type_in_form_is_rejected() {
        let res = serde_json::from_str::<WaterFormState>(r#"{"system_type":"aeroponics"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn default_water_layout_matches_drip_preset() {
        let w = WaterFormState::default();
        let layout = SystemType::Drip.layout();
        assert_eq!(w.tanks_count, layout.tanks_count);
        assert_eq!(w.nutrient_tank_target_l, layout.nutrient_tank_target_l);
        assert_eq!(w.enable_drain_control, layout.drain_control);
    }
}
