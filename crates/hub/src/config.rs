//! TOML config file loading and validation for zones and their recipes, and
//! seeding of the hub's form sessions.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;

use zone_automation::{reset_to_recommended, validate_forms, Recipe};

use crate::state::SharedState;

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub zones: Vec<ZoneEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ZoneEntry {
    pub zone_id: String,
    pub name: String,
    #[serde(default)]
    pub recipe: Recipe,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all config entries. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        self.validate_zones(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    fn validate_zones(&self, errors: &mut Vec<String>) {
        let mut seen_ids: HashSet<&str> = HashSet::new();

        for (i, z) in self.zones.iter().enumerate() {
            let ctx = || {
                if z.zone_id.is_empty() {
                    format!("zones[{i}]")
                } else {
                    format!("zone '{}'", z.zone_id)
                }
            };

            // ── Identity ────────────────────────────────────────
            if z.zone_id.trim().is_empty() {
                errors.push(format!("{}: zone_id is empty", ctx()));
            } else if !seen_ids.insert(&z.zone_id) {
                errors.push(format!("{}: duplicate zone_id", ctx()));
            }

            if z.name.trim().is_empty() {
                errors.push(format!("{}: name is empty", ctx()));
            }

            // ── Recipe targets ──────────────────────────────────
            for (form, field, target) in z.recipe.targets() {
                if !target.is_usable() {
                    errors.push(format!(
                        "{}: recipe target {form}.{field} is unusable ({target:?})",
                        ctx()
                    ));
                }
            }

            // ── Recommended forms must be submittable ───────────
            let report = validate_forms(&reset_to_recommended(&z.recipe));
            for e in &report.errors {
                errors.push(format!(
                    "{}: recommended {}.{} is invalid: {}",
                    ctx(),
                    e.form,
                    e.field,
                    e.message
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Load + apply
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file.
pub fn load(path: &str) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config: {path}"))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

/// Open a form session for every configured zone, seeded with the zone's
/// recommended settings.
pub async fn apply(config: &Config, state: &SharedState) {
    let mut st = state.write().await;
    for z in &config.zones {
        st.open_zone(&z.zone_id, &z.name, z.recipe.clone());
    }

    tracing::info!(zones = config.zones.len(), "config applied");
}

// ===========================================================================
// Tests
// ===========================================================================
