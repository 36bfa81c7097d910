use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use zone_automation::{
    apply_automation_from_recipe, build_growth_cycle_config_payload, reset_to_recommended,
    sync_system_to_tank_layout, validate_forms, AppliedFields, GrowthCycleConfigPayload, Recipe,
    SystemType, ValidationReport, WaterFormState, ZoneAutomationForms,
};

/// Maximum number of events retained in the ring buffer.
const MAX_EVENTS: usize = 200;

// ---------------------------------------------------------------------------
// Public type alias
// ---------------------------------------------------------------------------

pub type SharedState = Arc<RwLock<HubState>>;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

pub struct HubState {
    pub started_at: Instant,
    pub zones: BTreeMap<String, ZoneSession>,
    pub events: VecDeque<HubEvent>,
}

/// One zone-editing session: the recipe in force and the forms being edited.
#[derive(Clone, Serialize)]
pub struct ZoneSession {
    pub name: String,
    pub recipe: Recipe,
    pub forms: ZoneAutomationForms,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_changed: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Serialize)]
pub struct HubEvent {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    pub detail: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Forms,
    Recipe,
    Reset,
    Layout,
    Validation,
    Payload,
    System,
}

// ---------------------------------------------------------------------------
// JSON response (what the API returns)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    pub zones: Vec<ZoneSummary>,
    pub events: Vec<HubEvent>,
}

#[derive(Serialize)]
pub struct ZoneSummary {
    pub zone_id: String,
    pub name: String,
    pub system_type: SystemType,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_changed: Option<OffsetDateTime>,
}

/// Outcome of a submission attempt.
pub enum Submission {
    Ready(GrowthCycleConfigPayload),
    Rejected(ValidationReport),
}

// ---------------------------------------------------------------------------
// Construction & mutation
// ---------------------------------------------------------------------------

impl HubState {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            zones: BTreeMap::new(),
            events: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    /// Start (or restart) a session seeded with the recipe's recommendations.
    pub fn open_zone(&mut self, zone_id: &str, name: &str, recipe: Recipe) {
        let forms = reset_to_recommended(&recipe);
        self.zones.insert(
            zone_id.to_string(),
            ZoneSession {
                name: name.to_string(),
                recipe,
                forms,
                last_changed: None,
            },
        );
        self.push_event(EventKind::System, Some(zone_id), format!("session opened for '{name}'"));
    }

    /// Replace the forms with operator input. `None` if the zone is unknown.
    pub fn replace_forms(&mut self, zone_id: &str, forms: ZoneAutomationForms) -> Option<()> {
        let session = self.zones.get_mut(zone_id)?;
        session.forms = forms;
        session.last_changed = Some(OffsetDateTime::now_utc());
        self.push_event(EventKind::Forms, Some(zone_id), "forms updated by operator".into());
        Some(())
    }

    /// Store a new recipe and merge it into the current forms.
    pub fn apply_recipe(&mut self, zone_id: &str, recipe: Recipe) -> Option<AppliedFields> {
        let session = self.zones.get_mut(zone_id)?;
        let applied = apply_automation_from_recipe(&mut session.forms, &recipe);
        session.recipe = recipe;
        session.last_changed = Some(OffsetDateTime::now_utc());

        tracing::info!(zone = %zone_id, fields = applied.len(), "recipe applied");
        self.push_event(
            EventKind::Recipe,
            Some(zone_id),
            format!("recipe applied ({} field{})", applied.len(), plural(applied.len())),
        );
        Some(applied)
    }

    /// Discard operator edits and rebuild the forms from the stored recipe.
    pub fn reset(&mut self, zone_id: &str) -> Option<ZoneAutomationForms> {
        let session = self.zones.get_mut(zone_id)?;
        session.forms = reset_to_recommended(&session.recipe);
        session.last_changed = Some(OffsetDateTime::now_utc());
        let forms = session.forms.clone();

        tracing::info!(zone = %zone_id, "forms reset to recommended");
        self.push_event(EventKind::Reset, Some(zone_id), "reset to recommended settings".into());
        Some(forms)
    }

    /// Select an irrigation system and re-derive the tank layout.
    pub fn switch_system(&mut self, zone_id: &str, system_type: SystemType) -> Option<WaterFormState> {
        let session = self.zones.get_mut(zone_id)?;
        let previous = session.forms.water.system_type;
        sync_system_to_tank_layout(&mut session.forms.water, system_type);
        session.last_changed = Some(OffsetDateTime::now_utc());
        let water = session.forms.water.clone();

        if previous != system_type {
            tracing::info!(zone = %zone_id, from = %previous, to = %system_type, "system type switched");
            self.push_event(
                EventKind::Layout,
                Some(zone_id),
                format!("system type {previous} -> {system_type}"),
            );
        }
        Some(water)
    }

    pub fn validate(&mut self, zone_id: &str) -> Option<ValidationReport> {
        let report = validate_forms(&self.zones.get(zone_id)?.forms);
        if !report.valid {
            self.push_event(
                EventKind::Validation,
                Some(zone_id),
                format!("{} validation error{}", report.errors.len(), plural(report.errors.len())),
            );
        }
        Some(report)
    }

    /// Validate, then build the payload only if the forms are clean.
    pub fn submit(&mut self, zone_id: &str) -> Option<Submission> {
        let report = self.validate(zone_id)?;
        if !report.valid {
            tracing::warn!(zone = %zone_id, errors = report.errors.len(), "payload rejected");
            return Some(Submission::Rejected(report));
        }

        let payload = build_growth_cycle_config_payload(&self.zones.get(zone_id)?.forms);
        tracing::info!(zone = %zone_id, "growth-cycle payload built");
        self.push_event(EventKind::Payload, Some(zone_id), "growth-cycle payload built".into());
        Some(Submission::Ready(payload))
    }

    /// Record a generic system event.
    pub fn record_system(&mut self, detail: String) {
        self.push_event(EventKind::System, None, detail);
    }

    /// Build the JSON-serialisable status snapshot.
    pub fn to_status(&self) -> StatusResponse {
        StatusResponse {
            uptime_secs: self.started_at.elapsed().as_secs(),
            zones: self
                .zones
                .iter()
                .map(|(id, s)| ZoneSummary {
                    zone_id: id.clone(),
                    name: s.name.clone(),
                    system_type: s.forms.water.system_type,
                    last_changed: s.last_changed,
                })
                .collect(),
            events: self.events.iter().rev().cloned().collect(),
        }
    }

    fn push_event(&mut self, kind: EventKind, zone_id: Option<&str>, detail: String) {
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(HubEvent {
            ts: OffsetDateTime::now_utc(),
            kind,
            zone_id: zone_id.map(str::to_string),
            detail,
        });
    }
}

impl Default for HubState {
    fn default() -> Self {
        Self::new()
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_zone() -> HubState {
        let mut st = HubState::new();
        let recipe = Recipe::from_json(r#"{"climate":{"day_temp":25},"water":{"ec":2.0}}"#).unwrap();
        st.open_zone("z1", "Zone 1", recipe);
        st
    }

    fn kinds(st: &HubState) -> Vec<EventKind> {
        st.events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn open_zone_seeds_recommended_forms() {
        let st = state_with_zone();
        let s = &st.zones["z1"];
        assert_eq!(s.forms.climate.day_temp, 25.0);
        assert_eq!(s.forms.water.target_ec, 2.0);
        assert!(s.last_changed.is_none());
        assert_eq!(kinds(&st), vec![EventKind::System]);
    }

    #[test]
    fn unknown_zone_yields_none() {
        let mut st = state_with_zone();
        assert!(st.replace_forms("nope", ZoneAutomationForms::default()).is_none());
        assert!(st.apply_recipe("nope", Recipe::default()).is_none());
        assert!(st.reset("nope").is_none());
        assert!(st.switch_system("nope", SystemType::Nft).is_none());
        assert!(st.validate("nope").is_none());
        assert!(st.submit("nope").is_none());
    }

    #[test]
    fn apply_recipe_merges_and_stores_recipe() {
        let mut st = state_with_zone();
        st.zones.get_mut("z1").unwrap().forms.climate.night_temp = 16.0;
        let recipe = Recipe::from_json(r#"{"climate":{"day_temp":27}}"#).unwrap();

        let applied = st.apply_recipe("z1", recipe.clone()).unwrap();

        let s = &st.zones["z1"];
        assert_eq!(applied.len(), 1);
        assert_eq!(s.forms.climate.day_temp, 27.0);
        assert_eq!(s.forms.climate.night_temp, 16.0);
        assert_eq!(s.recipe, recipe);
        assert!(s.last_changed.is_some());
    }

    #[test]
    fn reset_uses_stored_recipe() {
        let mut st = state_with_zone();
        st.zones.get_mut("z1").unwrap().forms.climate.day_temp = 12.0;

        let forms = st.reset("z1").unwrap();
        assert_eq!(forms.climate.day_temp, 25.0);
        assert_eq!(st.zones["z1"].forms, forms);
        assert_eq!(kinds(&st).last(), Some(&EventKind::Reset));
    }

    #[test]
    fn switching_to_same_system_records_nothing() {
        let mut st = state_with_zone();
        st.switch_system("z1", SystemType::Drip).unwrap();
        assert_eq!(kinds(&st), vec![EventKind::System]);

        let water = st.switch_system("z1", SystemType::Nft).unwrap();
        assert_eq!(water.tanks_count, 1);
        assert_eq!(kinds(&st).last(), Some(&EventKind::Layout));
    }

    #[test]
    fn submit_rejects_invalid_forms() {
        let mut st = state_with_zone();
        let mut forms = st.zones["z1"].forms.clone();
        forms.water.irrigation_batch_l = 500.0;
        forms.water.nutrient_tank_target_l = 400.0;
        st.replace_forms("z1", forms).unwrap();

        match st.submit("z1").unwrap() {
            Submission::Rejected(report) => assert_eq!(report.fields(), vec!["water.irrigation_batch_l"]),
            Submission::Ready(_) => panic!("invalid forms produced a payload"),
        }
        assert_eq!(kinds(&st).last(), Some(&EventKind::Validation));
    }

    #[test]
    fn submit_builds_payload_for_valid_forms() {
        let mut st = state_with_zone();
        match st.submit("z1").unwrap() {
            Submission::Ready(p) => assert_eq!(p.climate.day_temp, 25.0),
            Submission::Rejected(r) => panic!("unexpected errors: {:?}", r.errors),
        }
        assert_eq!(kinds(&st).last(), Some(&EventKind::Payload));
    }

    #[test]
    fn event_buffer_is_bounded() {
        let mut st = HubState::new();
        for i in 0..(MAX_EVENTS + 25) {
            st.record_system(format!("event {i}"));
        }
        assert_eq!(st.events.len(), MAX_EVENTS);
        assert_eq!(st.events.front().unwrap().detail, "event 25");
    }

    #[test]
    fn status_lists_newest_events_first() {
        let mut st = state_with_zone();
        st.reset("z1").unwrap();
        st.record_system("later".into());
        let status = st.to_status();
        assert_eq!(status.zones.len(), 1);
        assert_eq!(status.zones[0].zone_id, "z1");
        assert_eq!(status.events[0].detail, "later");
        assert_eq!(status.events[0].zone_id, None);
        assert_eq!(status.events[1].zone_id.as_deref(), Some("z1"));
    }
}
