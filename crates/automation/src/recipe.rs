//! Cultivation recipes and how they flow into the zone forms.
//!
//! A recipe is untrusted, partial data: every target may be missing, a
//! single value, a `{ min, max }` range, or a numeric string. A target that
//! is absent or unusable means "no recommendation" and the form keeps what it
//! has.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::clock;
use crate::forms::{FormKind, LightingFormState, SystemType, ZoneAutomationForms};
use crate::layout::sync_system_to_tank_layout;
use crate::lenient::{self, NumberOrText};
use crate::ranges::{self, FieldRange};

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// One recipe target: a point value or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Target {
    Value(f64),
    Range { min: f64, max: f64 },
}

impl Target {
    /// The value a form should adopt: the point value, or the midpoint of a
    /// range. `None` for NaN/infinite input or an inverted range.
    pub fn recommended(&self) -> Option<f64> {
        let v = match *self {
            Self::Value(v) => v,
            Self::Range { min, max } if min <= max => min + (max - min) / 2.0,
            Self::Range { .. } => return None,
        };
        v.is_finite().then_some(v)
    }

    /// `true` when the target can produce a recommendation.
    pub fn is_usable(&self) -> bool {
        self.recommended().is_some()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Single(NumberOrText<f64>),
    Range {
        min: NumberOrText<f64>,
        max: NumberOrText<f64>,
    },
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawTarget::deserialize(deserializer)? {
            RawTarget::Single(v) => Target::Value(v.into_f64()),
            RawTarget::Range { min, max } => Target::Range {
                min: min.into_f64(),
                max: max.into_f64(),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateTargets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_temp: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub night_temp: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_humidity: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub night_humidity: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub night_start: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterTargets {
    #[serde(
        deserialize_with = "lenient::parsed_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_type: Option<SystemType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_temperature_c: Option<Target>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingTargets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lux_day: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lux_night: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_on: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_end: Option<String>,
}

/// Target values per climate, water and lighting dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipe {
    pub climate: ClimateTargets,
    pub water: WaterTargets,
    pub lighting: LightingTargets,
}

impl Recipe {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse recipe json")
    }

    /// Every numeric target present, tagged with the form field it drives.
    pub fn targets(&self) -> Vec<(FormKind, &'static str, Target)> {
        let (c, w, l) = (&self.climate, &self.water, &self.lighting);
        [
            (FormKind::Climate, "day_temp", c.day_temp),
            (FormKind::Climate, "night_temp", c.night_temp),
            (FormKind::Climate, "day_humidity", c.day_humidity),
            (FormKind::Climate, "night_humidity", c.night_humidity),
            (FormKind::Climate, "interval_minutes", c.interval_minutes),
            (FormKind::Water, "target_ph", w.ph),
            (FormKind::Water, "target_ec", w.ec),
            (FormKind::Water, "interval_minutes", w.interval_minutes),
            (FormKind::Water, "duration_seconds", w.duration_seconds),
            (FormKind::Water, "fill_temperature_c", w.fill_temperature_c),
            (FormKind::Lighting, "lux_day", l.lux_day),
            (FormKind::Lighting, "lux_night", l.lux_night),
            (FormKind::Lighting, "hours_on", l.hours_on),
            (FormKind::Lighting, "interval_minutes", l.interval_minutes),
        ]
        .into_iter()
        .filter_map(|(form, field, target)| target.map(|t| (form, field, t)))
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// A form field the recipe wrote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppliedField {
    pub form: FormKind,
    pub field: &'static str,
}

/// Every field a merge wrote, in application order. Callers use this to
/// decide which derived values need recomputing.
pub type AppliedFields = Vec<AppliedField>;

struct Merge<'a> {
    form: FormKind,
    applied: &'a mut AppliedFields,
}

impl Merge<'_> {
    fn mark(&mut self, field: &'static str) {
        self.applied.push(AppliedField {
            form: self.form,
            field,
        });
    }

    fn number(&mut self, field: &'static str, slot: &mut f64, target: Option<Target>, range: FieldRange) {
        let Some(v) = target.and_then(|t| t.recommended()) else {
            return;
        };
        let clamped = range.clamp(v);
        if clamped != v {
            debug!(form = %self.form, field, recommended = v, clamped, "recipe target clamped");
        }
        *slot = clamped;
        self.mark(field);
    }

    fn whole(&mut self, field: &'static str, slot: &mut u32, target: Option<Target>, range: FieldRange) {
        let Some(v) = target.and_then(|t| t.recommended()) else {
            return;
        };
        *slot = range.clamp_whole(v);
        self.mark(field);
    }

    /// Returns whether the target was applied.
    fn time(&mut self, field: &'static str, slot: &mut String, target: Option<&str>) -> bool {
        let Some(raw) = target else {
            return false;
        };
        match clock::normalize(raw) {
            Some(t) => {
                *slot = t;
                self.mark(field);
                true
            }
            None => {
                debug!(form = %self.form, field, raw, "ignoring unparseable recipe time");
                false
            }
        }
    }
}

/// A recipe that names only one end of the light schedule implies the other
/// through `hours_on`. Photoperiods of 0 or 24 hours have no distinct second
/// end and leave the form's value alone.
fn complete_schedule(m: &mut Merge<'_>, f: &mut LightingFormState, start_given: bool) {
    let minutes = (f.hours_on * 60.0).round();
    if !(minutes > 0.0 && minutes < 24.0 * 60.0) {
        debug!(hours_on = f.hours_on, "photoperiod has no distinct second schedule end");
        return;
    }
    let minutes = minutes as i64;

    if start_given {
        if let Some(start) = clock::parse_time_of_day(&f.schedule_start) {
            f.schedule_end = clock::format_time_of_day(clock::shift_minutes(start, minutes));
            m.mark("schedule_end");
        }
    } else if let Some(end) = clock::parse_time_of_day(&f.schedule_end) {
        f.schedule_start = clock::format_time_of_day(clock::shift_minutes(end, -minutes));
        m.mark("schedule_start");
    }
}

/// Merge `recipe` into `forms`.
///
/// Each recipe-controlled field with a usable target is set to that target
/// clamped into the field's range from [`crate::ranges`]. Fields the recipe
/// says nothing about are left alone, as are fields with no recipe
/// counterpart at all (overrides, diagnostics, refill workflow, valve
/// toggles). A recipe `system_type` that differs from the form's switches the
/// tank layout first.
///
/// Derived convenience values are not recomputed here; use the returned list
/// to decide what to refresh.
pub fn apply_automation_from_recipe(forms: &mut ZoneAutomationForms, recipe: &Recipe) -> AppliedFields {
    let mut applied = AppliedFields::new();

    // ── Climate ──────────────────────────────────────────────────
    let c = &recipe.climate;
    let f = &mut forms.climate;
    let mut m = Merge {
        form: FormKind::Climate,
        applied: &mut applied,
    };
    m.number("day_temp", &mut f.day_temp, c.day_temp, ranges::AIR_TEMP_C);
    m.number("night_temp", &mut f.night_temp, c.night_temp, ranges::AIR_TEMP_C);
    m.number("day_humidity", &mut f.day_humidity, c.day_humidity, ranges::AIR_HUMIDITY_PERCENT);
    m.number("night_humidity", &mut f.night_humidity, c.night_humidity, ranges::AIR_HUMIDITY_PERCENT);
    m.whole("interval_minutes", &mut f.interval_minutes, c.interval_minutes, ranges::CLIMATE_INTERVAL_MIN);
    m.time("day_start", &mut f.day_start, c.day_start.as_deref());
    m.time("night_start", &mut f.night_start, c.night_start.as_deref());

    // ── Water ────────────────────────────────────────────────────
    let w = &recipe.water;
    let f = &mut forms.water;
    let mut m = Merge {
        form: FormKind::Water,
        applied: &mut applied,
    };
    if let Some(system_type) = w.system_type {
        sync_system_to_tank_layout(f, system_type);
        m.mark("system_type");
    }
    m.number("target_ph", &mut f.target_ph, w.ph, ranges::SOLUTION_PH);
    m.number("target_ec", &mut f.target_ec, w.ec, ranges::SOLUTION_EC);
    m.whole("interval_minutes", &mut f.interval_minutes, w.interval_minutes, ranges::IRRIGATION_INTERVAL_MIN);
    m.whole("duration_seconds", &mut f.duration_seconds, w.duration_seconds, ranges::IRRIGATION_DURATION_SEC);
    m.number("fill_temperature_c", &mut f.fill_temperature_c, w.fill_temperature_c, ranges::FILL_TEMP_C);

    // ── Lighting ─────────────────────────────────────────────────
    let l = &recipe.lighting;
    let f = &mut forms.lighting;
    let mut m = Merge {
        form: FormKind::Lighting,
        applied: &mut applied,
    };
    m.number("lux_day", &mut f.lux_day, l.lux_day, ranges::LUX);
    m.number("lux_night", &mut f.lux_night, l.lux_night, ranges::LUX);
    m.number("hours_on", &mut f.hours_on, l.hours_on, ranges::HOURS_ON);
    m.whole("interval_minutes", &mut f.interval_minutes, l.interval_minutes, ranges::LIGHTING_INTERVAL_MIN);
    let start_given = m.time("schedule_start", &mut f.schedule_start, l.schedule_start.as_deref());
    let end_given = m.time("schedule_end", &mut f.schedule_end, l.schedule_end.as_deref());
    if start_given != end_given {
        complete_schedule(&mut m, f, start_given);
    }

    debug!(fields = applied.len(), "recipe merged into zone forms");
    applied
}

/// Build fresh forms from built-in safe defaults overlaid with the recipe's
/// recommendations. Prior operator state plays no part.
pub fn reset_to_recommended(recipe: &Recipe) -> ZoneAutomationForms {
    let mut forms = ZoneAutomationForms::default();
    apply_automation_from_recipe(&mut forms, recipe);
    forms
}

// ===========================================================================
// Tests
// ===========================================================================
